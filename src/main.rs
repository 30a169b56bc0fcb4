mod api;
mod config;
mod console;
mod session;
mod store;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::api::types::PaymentMode;

#[derive(Parser, Debug)]
#[command(name = "feesctl")]
#[command(about = "A terminal console for a school fee-management API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/feesctl/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Log in as the administrator (password from FEESCTL_PASSWORD)
  Login { email: String },
  /// Forget the saved session
  Logout,
  /// Show the logged-in administrator
  Whoami,
  /// Administrator account maintenance
  Admin {
    #[command(subcommand)]
    command: AdminCommand,
  },
  /// Counts, totals, latest payments and the 10-day collection series
  Dashboard,
  /// Manage courses
  Course {
    #[command(subcommand)]
    command: CourseCommand,
  },
  /// Manage students
  Student {
    #[command(subcommand)]
    command: StudentCommand,
  },
  /// Record and inspect fee payments
  Payment {
    #[command(subcommand)]
    command: PaymentCommand,
  },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
  /// Change the admin email and/or password (new password from FEESCTL_PASSWORD)
  Update {
    #[arg(long)]
    email: Option<String>,
    /// Take a new password from the environment and submit it
    #[arg(long)]
    password: bool,
  },
}

#[derive(Subcommand, Debug)]
enum CourseCommand {
  /// List all courses with the flat fee total
  List,
  /// Look up one course on the server
  Show { id: i64 },
  /// Add a course
  Add {
    name: String,
    #[arg(long, default_value_t = 1)]
    semester: u32,
    #[arg(long)]
    fee: f64,
  },
  /// Update a course
  Update {
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    semester: Option<u32>,
    #[arg(long)]
    fee: Option<f64>,
  },
  /// Delete a course
  Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum StudentCommand {
  /// List all students with paid/pending amounts
  List,
  /// Enroll a student
  Add {
    name: String,
    #[arg(long)]
    roll: String,
    #[arg(long, default_value = "")]
    contact: String,
    #[arg(long, default_value = "")]
    parent: String,
    #[arg(long)]
    course: i64,
    #[arg(long)]
    admitted: Option<String>,
  },
  /// Update a student record
  Update {
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    roll: Option<String>,
    #[arg(long)]
    contact: Option<String>,
    #[arg(long)]
    parent: Option<String>,
    #[arg(long)]
    course: Option<i64>,
  },
  /// Remove a student
  Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum PaymentCommand {
  /// List all payments, newest first
  List,
  /// Record a fee payment for a student
  Record {
    student: i64,
    #[arg(long)]
    amount: f64,
    #[arg(long, value_enum, default_value_t = PaymentMode::Cash)]
    mode: PaymentMode,
    #[arg(long)]
    remarks: Option<String>,
  },
  /// One student's payment history
  History { student: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  let config = config::Config::load(args.config.as_deref())?;
  let mut console = console::Console::new(config)?;

  match args.command {
    Command::Login { email } => console.login(email).await,
    Command::Logout => console.logout(),
    Command::Whoami => console.whoami(),
    Command::Admin {
      command: AdminCommand::Update { email, password },
    } => console.update_admin(email, password).await,
    Command::Dashboard => console.dashboard().await,
    Command::Course { command } => match command {
      CourseCommand::List => console.course_list().await,
      CourseCommand::Show { id } => console.course_show(id).await,
      CourseCommand::Add {
        name,
        semester,
        fee,
      } => console.course_add(name, semester, fee).await,
      CourseCommand::Update {
        id,
        name,
        semester,
        fee,
      } => console.course_update(id, name, semester, fee).await,
      CourseCommand::Delete { id } => console.course_delete(id).await,
    },
    Command::Student { command } => match command {
      StudentCommand::List => console.student_list().await,
      StudentCommand::Add {
        name,
        roll,
        contact,
        parent,
        course,
        admitted,
      } => {
        console
          .student_add(name, roll, contact, parent, course, admitted)
          .await
      }
      StudentCommand::Update {
        id,
        name,
        roll,
        contact,
        parent,
        course,
      } => {
        console
          .student_update(id, name, roll, contact, parent, course)
          .await
      }
      StudentCommand::Delete { id } => console.student_delete(id).await,
    },
    Command::Payment { command } => match command {
      PaymentCommand::List => console.payment_list().await,
      PaymentCommand::Record {
        student,
        amount,
        mode,
        remarks,
      } => console.payment_record(student, amount, mode, remarks).await,
      PaymentCommand::History { student } => console.payment_history(student).await,
    },
  }
}

/// Everything at the configured level goes to a log file under the data dir;
/// warnings and errors are mirrored to stderr so store-level soft failures
/// stay visible.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("feesctl");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let file_appender = tracing_appender::rolling::never(log_dir, "feesctl.log");
  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

  let file_layer = tracing_subscriber::fmt::layer()
    .with_writer(file_writer)
    .with_ansi(false);
  let stderr_layer = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .without_time()
    .with_target(false)
    .with_filter(LevelFilter::WARN);

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feesctl=info")))
    .with(file_layer)
    .with(stderr_layer)
    .init();

  Ok(guard)
}

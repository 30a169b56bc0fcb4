//! Command handlers: each one drives the stores against the remote service
//! and prints plain-text output. This is the whole "view layer" of the
//! console — state lives in the stores, presentation stays here.

use color_eyre::Result;

use crate::api::client::HttpRecordService;
use crate::api::types::{
  AdminUpdate, CourseUpdate, NewCourse, NewPayment, NewStudent, Payment, PaymentMode,
  StudentUpdate,
};
use crate::config::Config;
use crate::session::SessionStore;
use crate::store::admin::AdminStore;
use crate::store::Stores;

pub struct Console {
  config: Config,
  svc: HttpRecordService,
  admin: AdminStore,
  stores: Stores,
}

impl Console {
  pub fn new(config: Config) -> Result<Self> {
    let svc = HttpRecordService::new(&config)?;
    let admin = AdminStore::restore(SessionStore::open()?);
    Ok(Self {
      config,
      svc,
      admin,
      stores: Stores::new(),
    })
  }

  // ── Session ───────────────────────────────────────────────────────────

  pub async fn login(&mut self, email: String) -> Result<()> {
    let password = Config::get_password()?;
    let admin = self.admin.login(&self.svc, email, password).await?;
    println!("Logged in as {}", admin.email);
    Ok(())
  }

  pub fn logout(&mut self) -> Result<()> {
    self.admin.logout()?;
    println!("Logged out");
    Ok(())
  }

  pub fn whoami(&self) -> Result<()> {
    let admin = self.admin.require_login()?;
    println!("{} (admin #{})", admin.email, admin.admin_id);
    Ok(())
  }

  pub async fn update_admin(
    &mut self,
    email: Option<String>,
    change_password: bool,
  ) -> Result<()> {
    let id = self.admin.require_login()?.admin_id;
    let password = if change_password {
      Some(Config::get_password()?)
    } else {
      None
    };
    let admin = self
      .admin
      .update(&self.svc, id, AdminUpdate { email, password })
      .await?;
    println!("Admin updated: {}", admin.email);
    Ok(())
  }

  // ── Dashboard ─────────────────────────────────────────────────────────

  pub async fn dashboard(&mut self) -> Result<()> {
    self.admin.require_login()?;
    self.stores.refresh_all(&self.svc).await;

    println!("{}", self.config.display_title());
    println!();
    println!("Courses:          {:>10}", self.stores.courses.count());
    println!("Students:         {:>10}", self.stores.students.count());
    println!(
      "Collected:        {:>10.2}",
      self.stores.students.total_paid_fee()
    );
    println!(
      "Expected (total): {:>10.2}",
      self.stores.students.total_fee()
    );

    println!();
    println!("Latest payments");
    for p in self.stores.payments.latest_payments() {
      println!(
        "  {:<20} {:<16} {:>10.2}  {}",
        p.student_name,
        p.course_name,
        p.amount_paid,
        p.payment_date.as_deref().unwrap_or("-")
      );
    }

    println!();
    println!("Fee collection, last 10 days");
    for bucket in self.stores.payments.daily_fees() {
      println!("  {}  {:>10.2}", bucket.date, bucket.fees);
    }
    Ok(())
  }

  // ── Courses ───────────────────────────────────────────────────────────

  pub async fn course_list(&mut self) -> Result<()> {
    self.admin.require_login()?;
    self.stores.courses.refresh(&self.svc).await;

    println!("{:<6} {:<28} {:<4} {:>10}", "ID", "NAME", "SEM", "FEE");
    for c in self.stores.courses.courses() {
      println!(
        "{:<6} {:<28} {:<4} {:>10.2}",
        c.course_id, c.course_name, c.semester, c.fee_amount
      );
    }
    println!(
      "{} courses, flat total fee {:.2}",
      self.stores.courses.count(),
      self.stores.courses.total_fee()
    );
    Ok(())
  }

  pub async fn course_show(&mut self, id: i64) -> Result<()> {
    self.admin.require_login()?;
    match self.stores.courses.get_by_id(&self.svc, id).await {
      Some(c) => {
        println!("Course #{}: {}", c.course_id, c.course_name);
        println!("Semester: {}", c.semester);
        println!("Fee:      {:.2}", c.fee_amount);
      }
      None => println!("Course {} not found", id),
    }
    Ok(())
  }

  pub async fn course_add(&mut self, name: String, semester: u32, fee: f64) -> Result<()> {
    self.admin.require_login()?;
    self.stores.courses.refresh(&self.svc).await;
    self
      .stores
      .courses
      .add(
        &self.svc,
        NewCourse {
          course_name: name,
          semester,
          fee_amount: fee,
        },
      )
      .await;
    println!(
      "{} courses, flat total fee {:.2}",
      self.stores.courses.count(),
      self.stores.courses.total_fee()
    );
    Ok(())
  }

  pub async fn course_update(
    &mut self,
    id: i64,
    name: Option<String>,
    semester: Option<u32>,
    fee: Option<f64>,
  ) -> Result<()> {
    self.admin.require_login()?;
    self.stores.courses.refresh(&self.svc).await;
    let updated = self
      .stores
      .courses
      .update(
        &self.svc,
        id,
        CourseUpdate {
          course_name: name,
          semester,
          fee_amount: fee,
        },
      )
      .await?;
    println!("Course #{} updated: {}", updated.course_id, updated.course_name);
    Ok(())
  }

  pub async fn course_delete(&mut self, id: i64) -> Result<()> {
    self.admin.require_login()?;
    self.stores.courses.refresh(&self.svc).await;
    self.stores.courses.delete(&self.svc, id).await;
    println!(
      "{} courses remain, flat total fee {:.2}",
      self.stores.courses.count(),
      self.stores.courses.total_fee()
    );
    Ok(())
  }

  // ── Students ──────────────────────────────────────────────────────────

  pub async fn student_list(&mut self) -> Result<()> {
    self.admin.require_login()?;
    self.stores.courses.refresh(&self.svc).await;
    self
      .stores
      .students
      .refresh(&self.svc, self.stores.courses.courses())
      .await;

    println!(
      "{:<6} {:<24} {:<10} {:<20} {:>10} {:>10} {:>6}",
      "ID", "NAME", "ROLL", "COURSE", "PAID", "PENDING", "PAID%"
    );
    for s in self.stores.students.students() {
      println!(
        "{:<6} {:<24} {:<10} {:<20} {:>10.2} {:>10.2} {:>5.0}%",
        s.student_id,
        s.full_name,
        s.roll_no,
        s.course_name,
        s.paid_fee,
        s.pending_fee,
        s.paid_percent()
      );
    }
    println!(
      "{} students, collected {:.2} of {:.2}",
      self.stores.students.count(),
      self.stores.students.total_paid_fee(),
      self.stores.students.total_fee()
    );
    Ok(())
  }

  #[allow(clippy::too_many_arguments)]
  pub async fn student_add(
    &mut self,
    name: String,
    roll_no: String,
    contact: String,
    parent: String,
    course_id: i64,
    admission_date: Option<String>,
  ) -> Result<()> {
    self.admin.require_login()?;
    self.stores.courses.refresh(&self.svc).await;
    self
      .stores
      .add_student(
        &self.svc,
        NewStudent {
          full_name: name,
          roll_no,
          contact_no: contact,
          parent_name: parent,
          course_id,
          admission_date,
        },
      )
      .await;
    println!("{} students enrolled", self.stores.students.count());
    Ok(())
  }

  #[allow(clippy::too_many_arguments)]
  pub async fn student_update(
    &mut self,
    id: i64,
    name: Option<String>,
    roll_no: Option<String>,
    contact: Option<String>,
    parent: Option<String>,
    course_id: Option<i64>,
  ) -> Result<()> {
    self.admin.require_login()?;
    self.stores.courses.refresh(&self.svc).await;
    self
      .stores
      .update_student(
        &self.svc,
        id,
        StudentUpdate {
          full_name: name,
          roll_no,
          contact_no: contact,
          parent_name: parent,
          course_id,
        },
      )
      .await;
    println!("Student {} updated", id);
    Ok(())
  }

  pub async fn student_delete(&mut self, id: i64) -> Result<()> {
    self.admin.require_login()?;
    self.stores.courses.refresh(&self.svc).await;
    self.stores.delete_student(&self.svc, id).await;
    println!("{} students remain", self.stores.students.count());
    Ok(())
  }

  // ── Payments ──────────────────────────────────────────────────────────

  pub async fn payment_list(&mut self) -> Result<()> {
    self.admin.require_login()?;
    self.stores.payments.refresh(&self.svc).await;

    print_payment_rows(self.stores.payments.payments());
    println!(
      "{} payments, total collected {:.2}",
      self.stores.payments.payments().len(),
      self.stores.payments.total_paid_amount()
    );
    Ok(())
  }

  pub async fn payment_record(
    &mut self,
    student_id: i64,
    amount: f64,
    mode: PaymentMode,
    remarks: Option<String>,
  ) -> Result<()> {
    self.admin.require_login()?;
    self.stores.courses.refresh(&self.svc).await;
    let payment = self
      .stores
      .record_payment(
        &self.svc,
        NewPayment {
          student_id,
          amount_paid: amount,
          payment_mode: mode,
          remarks,
        },
      )
      .await?;
    println!(
      "Payment #{} recorded: {:.2} from {} ({}, {}% of course fee)",
      payment.payment_id,
      payment.amount_paid,
      payment.student_name,
      payment.payment_mode,
      payment.paid_percentage
    );
    Ok(())
  }

  pub async fn payment_history(&mut self, student_id: i64) -> Result<()> {
    self.admin.require_login()?;
    let history = self
      .stores
      .payments
      .for_student(&self.svc, student_id)
      .await?;

    print_payment_rows(&history);
    println!("{} payments", history.len());
    Ok(())
  }
}

fn print_payment_rows(payments: &[Payment]) {
  println!(
    "{:<6} {:<20} {:<16} {:>10} {:<8} {:>6} {:<12}",
    "ID", "STUDENT", "COURSE", "AMOUNT", "MODE", "PAID%", "DATE"
  );
  for p in payments {
    println!(
      "{:<6} {:<20} {:<16} {:>10.2} {:<8} {:>5}% {:<12}",
      p.payment_id,
      p.student_name,
      p.course_name,
      p.amount_paid,
      p.payment_mode.to_string(),
      p.paid_percentage,
      p.payment_date.as_deref().unwrap_or("-")
    );
  }
}

//! Domain types for the fee-management records.
//!
//! Enrichment fields (course/student names, percentages) live here too: they
//! are attached client-side after fetching and never sent back to the server.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel label used when a foreign key cannot be resolved against the
/// sibling cache. A broken relationship degrades the display, never the fetch.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A course offered by the institution.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
  pub course_id: i64,
  pub course_name: String,
  pub semester: u32,
  pub fee_amount: f64,
}

/// An enrolled student. `course_name` is enriched from the course cache;
/// `paid_fee`/`pending_fee` are server-supplied and not recomputed locally.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
  pub student_id: i64,
  pub full_name: String,
  pub roll_no: String,
  pub contact_no: String,
  pub parent_name: String,
  pub course_id: i64,
  pub course_name: String,
  pub total_fee: Option<f64>,
  pub paid_fee: f64,
  pub pending_fee: f64,
  pub admission_date: Option<String>,
  pub last_payment_date: Option<String>,
}

impl Student {
  /// Percentage of the total fee this student has paid, clamped to [0, 100]
  /// for profile display. Unknown or zero total yields 0.
  pub fn paid_percent(&self) -> f64 {
    match self.total_fee {
      Some(total) if total > 0.0 => (self.paid_fee / total * 100.0).clamp(0.0, 100.0),
      _ => 0.0,
    }
  }
}

/// How a fee payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum PaymentMode {
  Cash,
  Online,
  Card,
  Cheque,
}

impl std::fmt::Display for PaymentMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      PaymentMode::Cash => "Cash",
      PaymentMode::Online => "Online",
      PaymentMode::Card => "Card",
      PaymentMode::Cheque => "Cheque",
    };
    f.write_str(s)
  }
}

/// A recorded fee payment, append-only from the client's perspective.
///
/// `student_name`, `course_name`, `total_fee` and `paid_percentage` are
/// enrichment fields filled by the payment store.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
  pub payment_id: i64,
  pub student_id: i64,
  pub student_name: String,
  pub course_name: String,
  pub amount_paid: f64,
  pub total_fee: Option<f64>,
  pub paid_percentage: u32,
  pub payment_mode: PaymentMode,
  pub remarks: Option<String>,
  /// Server-assigned; may be absent or malformed on old records.
  pub payment_date: Option<String>,
}

impl Payment {
  /// Instant used for descending date sorts. A missing or unparseable date
  /// maps to the epoch so undated records sink to the bottom.
  pub fn sort_instant(&self) -> DateTime<Utc> {
    self
      .payment_date
      .as_deref()
      .and_then(parse_server_date)
      .unwrap_or(DateTime::UNIX_EPOCH)
  }

  /// Calendar day of the payment, if it carries a parseable date.
  pub fn day(&self) -> Option<NaiveDate> {
    self
      .payment_date
      .as_deref()
      .and_then(parse_server_date)
      .map(|dt| dt.date_naive())
  }
}

/// One bucket of the trailing 10-day fee-collection series.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyFee {
  pub date: NaiveDate,
  pub fees: f64,
}

/// The authenticated administrator. Serialized as-is into the session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
  #[serde(alias = "id")]
  pub admin_id: i64,
  pub email: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<String>,
}

/// Student update responses may carry the single updated record or the full
/// collection; the caller must branch on which shape arrived.
#[derive(Debug, Clone)]
pub enum UpdatedStudents {
  One(Student),
  All(Vec<Student>),
}

// ── Request bodies ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
  pub course_name: String,
  pub semester: u32,
  pub fee_amount: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub course_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub semester: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fee_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
  pub full_name: String,
  pub roll_no: String,
  pub contact_no: String,
  pub parent_name: String,
  pub course_id: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub admission_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub full_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub roll_no: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub contact_no: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub course_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
  pub student_id: i64,
  pub amount_paid: f64,
  pub payment_mode: PaymentMode,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
}

// ── Date handling ────────────────────────────────────────────────────────────

/// Parse the date formats the backend is known to emit: RFC 3339, a bare
/// datetime, or a bare calendar date (midnight UTC).
pub fn parse_server_date(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
    return Some(Utc.from_utc_datetime(&naive));
  }
  if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
    return Some(Utc.from_utc_datetime(&naive));
  }
  if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
  }
  None
}

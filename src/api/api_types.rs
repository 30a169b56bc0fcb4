//! Serde-deserializable types matching the fee-management API responses.
//!
//! These are separate from the domain types so the tolerant wire handling
//! (optional envelopes, defaulted fields, shape detection on student updates)
//! stays out of the rest of the application.

use serde::Deserialize;

use super::types::{Course, Payment, PaymentMode, Student, UpdatedStudents, UNKNOWN_LABEL};

/// Responses arrive either wrapped as `{ "data": T, ... }` or as a bare `T`;
/// callers must accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
  Wrapped { data: T },
  Bare(T),
}

impl<T> Envelope<T> {
  pub fn into_inner(self) -> T {
    match self {
      Envelope::Wrapped { data } => data,
      Envelope::Bare(inner) => inner,
    }
  }
}

/// Body of a non-2xx business error.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
  #[serde(default)]
  pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCourse {
  pub course_id: i64,
  #[serde(default)]
  pub course_name: String,
  #[serde(default)]
  pub semester: u32,
  #[serde(default)]
  pub fee_amount: f64,
}

impl From<ApiCourse> for Course {
  fn from(c: ApiCourse) -> Self {
    Course {
      course_id: c.course_id,
      course_name: c.course_name,
      semester: c.semester,
      fee_amount: c.fee_amount,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStudent {
  pub student_id: i64,
  #[serde(default)]
  pub full_name: String,
  #[serde(default)]
  pub roll_no: String,
  #[serde(default)]
  pub contact_no: String,
  #[serde(default)]
  pub parent_name: String,
  #[serde(default)]
  pub course_id: i64,
  #[serde(default)]
  pub total_fee: Option<f64>,
  #[serde(default)]
  pub paid_fee: f64,
  #[serde(default)]
  pub pending_fee: f64,
  #[serde(default)]
  pub admission_date: Option<String>,
  #[serde(default)]
  pub last_payment_date: Option<String>,
}

impl From<ApiStudent> for Student {
  /// The course name is a client-side enrichment; it starts at the sentinel
  /// and is filled in by the student store from the course snapshot.
  fn from(s: ApiStudent) -> Self {
    Student {
      student_id: s.student_id,
      full_name: s.full_name,
      roll_no: s.roll_no,
      contact_no: s.contact_no,
      parent_name: s.parent_name,
      course_id: s.course_id,
      course_name: UNKNOWN_LABEL.to_string(),
      total_fee: s.total_fee,
      paid_fee: s.paid_fee,
      pending_fee: s.pending_fee,
      admission_date: s.admission_date,
      last_payment_date: s.last_payment_date,
    }
  }
}

/// A student update may answer with the single updated record or with the
/// full collection.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiStudentUpdateResponse {
  One(ApiStudent),
  All(Vec<ApiStudent>),
}

impl From<ApiStudentUpdateResponse> for UpdatedStudents {
  fn from(r: ApiStudentUpdateResponse) -> Self {
    match r {
      ApiStudentUpdateResponse::One(s) => UpdatedStudents::One(s.into()),
      ApiStudentUpdateResponse::All(list) => {
        UpdatedStudents::All(list.into_iter().map(Student::from).collect())
      }
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPayment {
  pub payment_id: i64,
  pub student_id: i64,
  #[serde(default)]
  pub amount_paid: f64,
  pub payment_mode: PaymentMode,
  #[serde(default)]
  pub remarks: Option<String>,
  #[serde(default)]
  pub payment_date: Option<String>,
}

impl From<ApiPayment> for Payment {
  /// Enrichment fields start at their sentinels; the payment store fills
  /// them from the student and course lookups.
  fn from(p: ApiPayment) -> Self {
    Payment {
      payment_id: p.payment_id,
      student_id: p.student_id,
      student_name: UNKNOWN_LABEL.to_string(),
      course_name: UNKNOWN_LABEL.to_string(),
      amount_paid: p.amount_paid,
      total_fee: None,
      paid_percentage: 0,
      payment_mode: p.payment_mode,
      remarks: p.remarks,
      payment_date: p.payment_date,
    }
  }
}

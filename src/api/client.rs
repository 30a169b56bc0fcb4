//! HTTP implementation of [`RecordService`] over the REST backend.

use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use crate::config::Config;

use super::api_types::{ApiCourse, ApiPayment, ApiStudent, ApiStudentUpdateResponse, Envelope, ErrorBody};
use super::service::RecordService;
use super::types::{
  Admin, AdminUpdate, Course, CourseUpdate, NewCourse, NewPayment, NewStudent, Payment, Student,
  StudentUpdate, UpdatedStudents,
};

/// Requests that outlive this are reported as errors instead of leaving the
/// caller waiting forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fee-management API client.
#[derive(Clone)]
pub struct HttpRecordService {
  http: reqwest::Client,
  base: Url,
}

impl HttpRecordService {
  pub fn new(config: &Config) -> Result<Self> {
    let mut base = Url::parse(&config.server.url)
      .map_err(|e| eyre!("Invalid server URL {}: {}", config.server.url, e))?;

    // Url::join treats a missing trailing slash as a file component.
    if !base.path().ends_with('/') {
      base.set_path(&format!("{}/", base.path()));
    }

    let http = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint {}: {}", path, e))
  }

  /// Check the response status and decode the (possibly enveloped) body.
  /// Non-2xx responses surface the server's `message` field when present.
  async fn decode<T: DeserializeOwned>(resp: reqwest::Response, what: &str) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
      let message = resp
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message);
      return Err(match message {
        Some(msg) => eyre!("{} failed: {}", what, msg),
        None => eyre!("{} failed with status {}", what, status),
      });
    }

    let envelope: Envelope<T> = resp
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse {} response: {}", what, e))?;
    Ok(envelope.into_inner())
  }

  async fn get<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
    let resp = self
      .http
      .get(self.endpoint(path)?)
      .send()
      .await
      .map_err(|e| eyre!("{} failed: {}", what, e))?;
    Self::decode(resp, what).await
  }

  /// GET where a 404 means the record does not exist rather than a failure.
  async fn get_optional<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<Option<T>> {
    let resp = self
      .http
      .get(self.endpoint(path)?)
      .send()
      .await
      .map_err(|e| eyre!("{} failed: {}", what, e))?;

    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Self::decode(resp, what).await.map(Some)
  }

  async fn post<B: Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
    what: &str,
  ) -> Result<T> {
    let resp = self
      .http
      .post(self.endpoint(path)?)
      .json(body)
      .send()
      .await
      .map_err(|e| eyre!("{} failed: {}", what, e))?;
    Self::decode(resp, what).await
  }

  async fn put<B: Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
    what: &str,
  ) -> Result<T> {
    let resp = self
      .http
      .put(self.endpoint(path)?)
      .json(body)
      .send()
      .await
      .map_err(|e| eyre!("{} failed: {}", what, e))?;
    Self::decode(resp, what).await
  }

  async fn delete(&self, path: &str, what: &str) -> Result<()> {
    let resp = self
      .http
      .delete(self.endpoint(path)?)
      .send()
      .await
      .map_err(|e| eyre!("{} failed: {}", what, e))?;

    let status = resp.status();
    if !status.is_success() {
      let message = resp
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message);
      return Err(match message {
        Some(msg) => eyre!("{} failed: {}", what, msg),
        None => eyre!("{} failed with status {}", what, status),
      });
    }
    Ok(())
  }
}

impl RecordService for HttpRecordService {
  async fn login(&self, email: String, password: String) -> Result<Admin> {
    let body = serde_json::json!({ "email": email, "password": password });
    self.post("admin/login", &body, "Login").await
  }

  async fn update_admin(&self, id: i64, update: AdminUpdate) -> Result<Admin> {
    self
      .put(&format!("admin/update/{}", id), &update, "Admin update")
      .await
  }

  async fn list_courses(&self) -> Result<Vec<Course>> {
    let courses: Vec<ApiCourse> = self.get("courses", "Course list").await?;
    Ok(courses.into_iter().map(Course::from).collect())
  }

  async fn get_course(&self, id: i64) -> Result<Option<Course>> {
    let course: Option<ApiCourse> = self
      .get_optional(&format!("courses/{}", id), "Course lookup")
      .await?;
    Ok(course.map(Course::from))
  }

  async fn create_course(&self, new: NewCourse) -> Result<Course> {
    let course: ApiCourse = self.post("courses", &new, "Course create").await?;
    Ok(course.into())
  }

  async fn update_course(&self, id: i64, update: CourseUpdate) -> Result<Course> {
    let course: ApiCourse = self
      .put(&format!("courses/{}", id), &update, "Course update")
      .await?;
    Ok(course.into())
  }

  async fn delete_course(&self, id: i64) -> Result<()> {
    self
      .delete(&format!("courses/{}", id), "Course delete")
      .await
  }

  async fn list_students(&self) -> Result<Vec<Student>> {
    let students: Vec<ApiStudent> = self.get("students", "Student list").await?;
    Ok(students.into_iter().map(Student::from).collect())
  }

  async fn get_student(&self, id: i64) -> Result<Option<Student>> {
    let student: Option<ApiStudent> = self
      .get_optional(&format!("students/{}", id), "Student lookup")
      .await?;
    Ok(student.map(Student::from))
  }

  async fn create_student(&self, new: NewStudent) -> Result<Student> {
    let student: ApiStudent = self.post("students", &new, "Student create").await?;
    Ok(student.into())
  }

  async fn update_student(&self, id: i64, update: StudentUpdate) -> Result<UpdatedStudents> {
    let resp: ApiStudentUpdateResponse = self
      .put(&format!("students/{}", id), &update, "Student update")
      .await?;
    Ok(resp.into())
  }

  async fn delete_student(&self, id: i64) -> Result<()> {
    self
      .delete(&format!("students/{}", id), "Student delete")
      .await
  }

  async fn list_payments(&self) -> Result<Vec<Payment>> {
    let payments: Vec<ApiPayment> = self.get("payments", "Payment list").await?;
    Ok(payments.into_iter().map(Payment::from).collect())
  }

  async fn create_payment(&self, new: NewPayment) -> Result<Payment> {
    let payment: ApiPayment = self.post("payments", &new, "Payment create").await?;
    Ok(payment.into())
  }

  async fn payments_by_student(&self, student_id: i64) -> Result<Vec<Payment>> {
    let payments: Vec<ApiPayment> = self
      .get(
        &format!("payments/student/{}", student_id),
        "Student payment history",
      )
      .await?;
    Ok(payments.into_iter().map(Payment::from).collect())
  }
}

//! The [`RecordService`] trait — the boundary to the remote record service.
//!
//! The stores depend on this abstraction, not on the HTTP client, so tests
//! can drive them against an in-memory implementation. All methods return
//! `Send` futures so callers can fan requests out across tasks.

use std::future::Future;

use color_eyre::Result;

use super::types::{
  Admin, AdminUpdate, Course, CourseUpdate, NewCourse, NewPayment, NewStudent, Payment, Student,
  StudentUpdate, UpdatedStudents,
};

/// Abstraction over the remote fee-management API.
///
/// The remote service is the source of truth; everything the client holds is
/// a cache of these responses. Point lookups (`get_course`, `get_student`)
/// resolve "not found" to `None` rather than an error.
pub trait RecordService: Send + Sync {
  // ── Admin ─────────────────────────────────────────────────────────────

  fn login(
    &self,
    email: String,
    password: String,
  ) -> impl Future<Output = Result<Admin>> + Send + '_;

  fn update_admin(
    &self,
    id: i64,
    update: AdminUpdate,
  ) -> impl Future<Output = Result<Admin>> + Send + '_;

  // ── Courses ───────────────────────────────────────────────────────────

  fn list_courses(&self) -> impl Future<Output = Result<Vec<Course>>> + Send + '_;

  fn get_course(&self, id: i64) -> impl Future<Output = Result<Option<Course>>> + Send + '_;

  fn create_course(&self, new: NewCourse) -> impl Future<Output = Result<Course>> + Send + '_;

  fn update_course(
    &self,
    id: i64,
    update: CourseUpdate,
  ) -> impl Future<Output = Result<Course>> + Send + '_;

  fn delete_course(&self, id: i64) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Students ──────────────────────────────────────────────────────────

  fn list_students(&self) -> impl Future<Output = Result<Vec<Student>>> + Send + '_;

  fn get_student(&self, id: i64) -> impl Future<Output = Result<Option<Student>>> + Send + '_;

  fn create_student(&self, new: NewStudent) -> impl Future<Output = Result<Student>> + Send + '_;

  /// The response may carry the single updated record or the full
  /// collection; see [`UpdatedStudents`].
  fn update_student(
    &self,
    id: i64,
    update: StudentUpdate,
  ) -> impl Future<Output = Result<UpdatedStudents>> + Send + '_;

  fn delete_student(&self, id: i64) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Payments ──────────────────────────────────────────────────────────

  fn list_payments(&self) -> impl Future<Output = Result<Vec<Payment>>> + Send + '_;

  fn create_payment(&self, new: NewPayment) -> impl Future<Output = Result<Payment>> + Send + '_;

  fn payments_by_student(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Vec<Payment>>> + Send + '_;
}

//! Student aggregate cache.
//!
//! Every record is joined against the course snapshot for a display name
//! ("Unknown" when the course id does not resolve — a soft fail, not an
//! error). Mutations apply optimistically and then trigger a full refetch so
//! the derived totals cannot drift.

use tracing::warn;

use crate::api::service::RecordService;
use crate::api::types::{Course, NewStudent, Student, StudentUpdate, UpdatedStudents, UNKNOWN_LABEL};

use super::courses::system_wide_total;

#[derive(Debug, Default)]
pub struct StudentStore {
  students: Vec<Student>,
  total_paid_fee: f64,
  total_fee: f64,
  loading: bool,
}

impl StudentStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn students(&self) -> &[Student] {
    &self.students
  }

  pub fn count(&self) -> usize {
    self.students.len()
  }

  /// Σ paid_fee over all cached students.
  pub fn total_paid_fee(&self) -> f64 {
    self.total_paid_fee
  }

  /// System-wide total fee: Σ course fee × enrolled count.
  pub fn total_fee(&self) -> f64 {
    self.total_fee
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  /// Replace the cache with the server's student list, enrich against the
  /// course snapshot, and recompute the derived totals. Fails open.
  pub async fn refresh<S: RecordService>(&mut self, svc: &S, courses: &[Course]) {
    self.loading = true;
    match svc.list_students().await {
      Ok(mut students) => {
        for student in &mut students {
          enrich_course_name(student, courses);
        }
        self.total_paid_fee = students.iter().map(|s| s.paid_fee).sum();
        self.total_fee = system_wide_total(courses, &students);
        self.students = students;
      }
      Err(e) => warn!("Failed to fetch students: {e}"),
    }
    self.loading = false;
  }

  /// Submit a new student, append it locally, then refetch so the
  /// system-wide total accounts for the new enrollment.
  pub async fn add<S: RecordService>(&mut self, svc: &S, new: NewStudent, courses: &[Course]) {
    self.loading = true;
    match svc.create_student(new).await {
      Ok(mut student) => {
        enrich_course_name(&mut student, courses);
        self.students.push(student);
        self.refresh(svc, courses).await;
      }
      Err(e) => {
        self.loading = false;
        warn!("Failed to add student: {e}");
      }
    }
  }

  /// Submit a patch. The response may be the single updated record or the
  /// full collection; both shapes are applied, then a refetch keeps the
  /// totals accurate.
  pub async fn update<S: RecordService>(
    &mut self,
    svc: &S,
    id: i64,
    update: StudentUpdate,
    courses: &[Course],
  ) {
    self.loading = true;
    match svc.update_student(id, update).await {
      Ok(UpdatedStudents::One(mut updated)) => {
        enrich_course_name(&mut updated, courses);
        if let Some(slot) = self
          .students
          .iter_mut()
          .find(|s| s.student_id == updated.student_id)
        {
          *slot = updated;
        }
        self.refresh(svc, courses).await;
      }
      Ok(UpdatedStudents::All(mut students)) => {
        for student in &mut students {
          enrich_course_name(student, courses);
        }
        self.students = students;
        self.refresh(svc, courses).await;
      }
      Err(e) => {
        self.loading = false;
        warn!("Failed to update student {id}: {e}");
      }
    }
  }

  /// Submit a deletion, drop the record locally, then refetch.
  pub async fn delete<S: RecordService>(&mut self, svc: &S, id: i64, courses: &[Course]) {
    self.loading = true;
    match svc.delete_student(id).await {
      Ok(()) => {
        self.students.retain(|s| s.student_id != id);
        self.total_paid_fee = self.students.iter().map(|s| s.paid_fee).sum();
        self.refresh(svc, courses).await;
      }
      Err(e) => {
        self.loading = false;
        warn!("Failed to delete student {id}: {e}");
      }
    }
  }
}

fn enrich_course_name(student: &mut Student, courses: &[Course]) {
  student.course_name = courses
    .iter()
    .find(|c| c.course_id == student.course_id)
    .map(|c| c.course_name.clone())
    .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
}

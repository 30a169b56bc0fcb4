//! Course aggregate cache.
//!
//! Holds the fetched course list plus the flat total of per-course fee
//! amounts. The system-wide total (fee × enrolled count) lives in
//! [`system_wide_total`] because it needs the student snapshot too.

use std::collections::HashMap;

use color_eyre::Result;
use tracing::{error, warn};

use crate::api::service::RecordService;
use crate::api::types::{Course, CourseUpdate, NewCourse, Student};

#[derive(Debug, Default)]
pub struct CourseStore {
  courses: Vec<Course>,
  total_fee: f64,
  loading: bool,
}

impl CourseStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn courses(&self) -> &[Course] {
    &self.courses
  }

  pub fn count(&self) -> usize {
    self.courses.len()
  }

  /// Flat sum of fee amounts over all cached courses.
  pub fn total_fee(&self) -> f64 {
    self.total_fee
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  /// Replace the cache with the server's course list and recompute totals.
  ///
  /// Fails open: on error the prior contents stay untouched and the error is
  /// surfaced as a warning rather than returned.
  pub async fn refresh<S: RecordService>(&mut self, svc: &S) {
    self.loading = true;
    match svc.list_courses().await {
      Ok(courses) => {
        self.total_fee = flat_total(&courses);
        self.courses = courses;
      }
      Err(e) => warn!("Failed to fetch courses: {e}"),
    }
    self.loading = false;
  }

  /// Point lookup against the server, not the local cache, so the result
  /// always reflects server state.
  pub async fn get_by_id<S: RecordService>(&self, svc: &S, id: i64) -> Option<Course> {
    match svc.get_course(id).await {
      Ok(course) => course,
      Err(e) => {
        warn!("Failed to fetch course {id}: {e}");
        None
      }
    }
  }

  /// Submit a new course; on success append it locally. No refetch.
  pub async fn add<S: RecordService>(&mut self, svc: &S, new: NewCourse) {
    match svc.create_course(new).await {
      Ok(course) => {
        self.courses.push(course);
        self.total_fee = flat_total(&self.courses);
      }
      Err(e) => warn!("Failed to add course: {e}"),
    }
  }

  /// Submit a patch and replace the matching entry by id.
  ///
  /// Unlike the other mutations this propagates the failure, so the caller
  /// can keep the user on the edit form.
  pub async fn update<S: RecordService>(
    &mut self,
    svc: &S,
    id: i64,
    update: CourseUpdate,
  ) -> Result<Course> {
    let updated = svc.update_course(id, update).await.inspect_err(|e| {
      error!("Failed to update course {id}: {e}");
    })?;

    if let Some(slot) = self
      .courses
      .iter_mut()
      .find(|c| c.course_id == updated.course_id)
    {
      *slot = updated.clone();
    }
    Ok(updated)
  }

  /// Submit a deletion; on success remove locally and recompute the total.
  pub async fn delete<S: RecordService>(&mut self, svc: &S, id: i64) {
    match svc.delete_course(id).await {
      Ok(()) => {
        self.courses.retain(|c| c.course_id != id);
        self.total_fee = flat_total(&self.courses);
      }
      Err(e) => warn!("Failed to delete course {id}: {e}"),
    }
  }
}

fn flat_total(courses: &[Course]) -> f64 {
  courses.iter().map(|c| c.fee_amount).sum()
}

/// Total theoretical revenue: Σ over distinct courses of
/// fee_amount × enrolled-student count. Students whose course id is absent
/// from the course set contribute nothing.
pub fn system_wide_total(courses: &[Course], students: &[Student]) -> f64 {
  let mut enrolled: HashMap<i64, usize> = HashMap::new();
  for student in students {
    *enrolled.entry(student.course_id).or_default() += 1;
  }

  courses
    .iter()
    .map(|c| c.fee_amount * enrolled.get(&c.course_id).copied().unwrap_or(0) as f64)
    .sum()
}

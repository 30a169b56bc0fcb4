//! Client-side state containers, one per entity type.
//!
//! Each store holds a snapshot of a server collection plus derived
//! aggregates; cross-store dependencies (students need the course snapshot)
//! are passed explicitly rather than read from any ambient global. The
//! caches are never authoritative — every mutation reconciles by refetching.

pub mod admin;
pub mod courses;
pub mod payments;
pub mod students;

#[cfg(test)]
pub(crate) mod testutil;

use color_eyre::Result;

use crate::api::service::RecordService;
use crate::api::types::{NewPayment, NewStudent, Payment, StudentUpdate};

use courses::CourseStore;
use payments::PaymentStore;
use students::StudentStore;

/// The three entity caches, owned together so cross-cache rules have one
/// home.
#[derive(Default)]
pub struct Stores {
  pub courses: CourseStore,
  pub students: StudentStore,
  pub payments: PaymentStore,
}

impl Stores {
  pub fn new() -> Self {
    Self::default()
  }

  /// Load everything in dependency order: courses first (students join
  /// against them), then students, then payments.
  pub async fn refresh_all<S: RecordService>(&mut self, svc: &S) {
    self.courses.refresh(svc).await;
    self.students.refresh(svc, self.courses.courses()).await;
    self.payments.refresh(svc).await;
  }

  pub async fn add_student<S: RecordService>(&mut self, svc: &S, new: NewStudent) {
    self
      .students
      .add(svc, new, self.courses.courses())
      .await;
  }

  pub async fn update_student<S: RecordService>(
    &mut self,
    svc: &S,
    id: i64,
    update: StudentUpdate,
  ) {
    self
      .students
      .update(svc, id, update, self.courses.courses())
      .await;
  }

  pub async fn delete_student<S: RecordService>(&mut self, svc: &S, id: i64) {
    self
      .students
      .delete(svc, id, self.courses.courses())
      .await;
  }

  /// Record a payment, then refresh the student cache exactly once: the
  /// server adjusts the student's paid/pending figures as a side effect of
  /// the payment, so the cached copy is stale the moment the create lands.
  pub async fn record_payment<S: RecordService>(
    &mut self,
    svc: &S,
    new: NewPayment,
  ) -> Result<Payment> {
    let payment = self.payments.create(svc, new).await?;
    self.students.refresh(svc, self.courses.courses()).await;
    Ok(payment)
  }
}

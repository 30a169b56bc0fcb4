//! Payment aggregate cache.
//!
//! Each payment is enriched with its student's and course's display data via
//! two dependent lookups, issued concurrently across payments so the batch
//! waits on the slowest lookup rather than the sum. A failed lookup degrades
//! that one payment to the sentinel labels and 0% — the rest of the batch is
//! unaffected.

use chrono::{Days, NaiveDate, Utc};
use color_eyre::{eyre::eyre, Result};
use futures::future::join_all;
use tracing::{error, warn};

use crate::api::service::RecordService;
use crate::api::types::{DailyFee, NewPayment, Payment};

/// Length of the dashboard fee-collection series, in calendar days.
const SERIES_DAYS: u64 = 10;

/// How many payments the dashboard shows as "latest".
const LATEST_COUNT: usize = 3;

#[derive(Debug, Default)]
pub struct PaymentStore {
  payments: Vec<Payment>,
  latest_payments: Vec<Payment>,
  total_paid_amount: f64,
  daily_fees: Vec<DailyFee>,
  loading: bool,
}

impl PaymentStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// All payments, sorted descending by payment date (undated records last).
  pub fn payments(&self) -> &[Payment] {
    &self.payments
  }

  /// The most recent payments, at most [`LATEST_COUNT`].
  pub fn latest_payments(&self) -> &[Payment] {
    &self.latest_payments
  }

  /// Σ amount_paid over all cached payments, window or not.
  pub fn total_paid_amount(&self) -> f64 {
    self.total_paid_amount
  }

  /// The trailing 10-day collection series, oldest bucket first.
  pub fn daily_fees(&self) -> &[DailyFee] {
    &self.daily_fees
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  /// Fetch all payments, enrich each one concurrently, and recompute the
  /// derived views. Fails open.
  pub async fn refresh<S: RecordService>(&mut self, svc: &S) {
    self.loading = true;
    match svc.list_payments().await {
      Ok(raw) => {
        let enriched = join_all(raw.into_iter().map(|p| enrich(svc, p))).await;
        self.apply(enriched, Utc::now().date_naive());
      }
      Err(e) => warn!("Failed to fetch payments: {e}"),
    }
    self.loading = false;
  }

  /// Submit a new payment, enrich just that record, append it, and recompute
  /// every derived view from the full list.
  ///
  /// The error propagates so the caller can react; note that a successful
  /// create must be followed by a student-cache refresh (the server updates
  /// the student's paid/pending figures) — [`crate::store::Stores`] owns that
  /// invalidation.
  pub async fn create<S: RecordService>(&mut self, svc: &S, new: NewPayment) -> Result<Payment> {
    let payment = match svc.create_payment(new).await {
      Ok(p) => p,
      Err(e) => {
        error!("Failed to record payment: {e}");
        return Err(e);
      }
    };

    let payment = enrich(svc, payment).await;
    self.payments.push(payment.clone());
    let list = std::mem::take(&mut self.payments);
    self.apply(list, Utc::now().date_naive());
    Ok(payment)
  }

  /// One student's payment history, enriched from a single student/course
  /// lookup shared across the batch.
  pub async fn for_student<S: RecordService>(
    &self,
    svc: &S,
    student_id: i64,
  ) -> Result<Vec<Payment>> {
    let raw = svc.payments_by_student(student_id).await?;
    let student = svc
      .get_student(student_id)
      .await?
      .ok_or_else(|| eyre!("Student {} not found", student_id))?;
    let course = svc
      .get_course(student.course_id)
      .await?
      .ok_or_else(|| eyre!("Course {} not found", student.course_id))?;

    Ok(
      raw
        .into_iter()
        .map(|mut p| {
          p.student_name = student.full_name.clone();
          p.course_name = course.course_name.clone();
          p.total_fee = Some(course.fee_amount);
          p.paid_percentage = percentage(p.amount_paid, course.fee_amount);
          p
        })
        .collect(),
    )
  }

  fn apply(&mut self, mut payments: Vec<Payment>, today: NaiveDate) {
    self.total_paid_amount = payments.iter().map(|p| p.amount_paid).sum();
    payments.sort_by(|a, b| b.sort_instant().cmp(&a.sort_instant()));
    self.latest_payments = payments.iter().take(LATEST_COUNT).cloned().collect();
    self.daily_fees = daily_fees(&payments, today);
    self.payments = payments;
  }
}

/// Two dependent lookups per payment: the student, then that student's
/// course. Any failure along the way leaves the sentinels in place.
async fn enrich<S: RecordService>(svc: &S, mut payment: Payment) -> Payment {
  let resolved = async {
    let student = svc.get_student(payment.student_id).await.ok().flatten()?;
    let course = svc.get_course(student.course_id).await.ok().flatten()?;
    Some((student, course))
  }
  .await;

  if let Some((student, course)) = resolved {
    payment.student_name = student.full_name;
    payment.course_name = course.course_name;
    payment.total_fee = Some(course.fee_amount);
    payment.paid_percentage = percentage(payment.amount_paid, course.fee_amount);
  }
  payment
}

/// Rounded share of the course fee this payment covers. Not cumulative and
/// not capped, so a payment larger than the fee reads as more than 100%.
fn percentage(amount: f64, total_fee: f64) -> u32 {
  if total_fee > 0.0 {
    (amount / total_fee * 100.0).round() as u32
  } else {
    0
  }
}

/// Bucket payments into the trailing [`SERIES_DAYS`] calendar days, oldest
/// first, last bucket = `today`. Payments outside the window (or undated)
/// are dropped from the series.
pub fn daily_fees(payments: &[Payment], today: NaiveDate) -> Vec<DailyFee> {
  let mut buckets: Vec<DailyFee> = (0..SERIES_DAYS)
    .rev()
    .filter_map(|i| today.checked_sub_days(Days::new(i)))
    .map(|date| DailyFee { date, fees: 0.0 })
    .collect();

  for payment in payments {
    let Some(day) = payment.day() else { continue };
    if let Some(bucket) = buckets.iter_mut().find(|b| b.date == day) {
      bucket.fees += payment.amount_paid;
    }
  }

  buckets
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{PaymentMode, UNKNOWN_LABEL};
  use crate::store::testutil::{course, payment_on, student_in_course, FakeService};

  fn day_str(days_ago: u64) -> String {
    Utc::now()
      .date_naive()
      .checked_sub_days(Days::new(days_ago))
      .unwrap()
      .format("%Y-%m-%d")
      .to_string()
  }

  #[tokio::test]
  async fn refresh_enriches_with_student_and_course() {
    let svc = FakeService::new()
      .with_courses(vec![course(1, "CS", 1000.0)])
      .with_students(vec![student_in_course(7, 1)])
      .with_payments(vec![payment_on(1, 7, 500.0, Some("2024-01-01"))]);

    let mut store = PaymentStore::new();
    store.refresh(&svc).await;

    let p = &store.payments()[0];
    assert_eq!(p.student_name, "Student 7");
    assert_eq!(p.course_name, "CS");
    assert_eq!(p.total_fee, Some(1000.0));
    assert_eq!(p.paid_percentage, 50);
    assert_eq!(store.total_paid_amount(), 500.0);
  }

  #[tokio::test]
  async fn enrichment_soft_fails_per_payment() {
    // Payment 2 references a student that no longer exists.
    let svc = FakeService::new()
      .with_courses(vec![course(1, "CS", 1000.0)])
      .with_students(vec![student_in_course(7, 1)])
      .with_payments(vec![
        payment_on(1, 7, 500.0, Some("2024-01-01")),
        payment_on(2, 99, 250.0, Some("2024-01-02")),
      ]);

    let mut store = PaymentStore::new();
    store.refresh(&svc).await;

    assert_eq!(store.payments().len(), 2);
    let broken = store
      .payments()
      .iter()
      .find(|p| p.payment_id == 2)
      .unwrap();
    assert_eq!(broken.student_name, UNKNOWN_LABEL);
    assert_eq!(broken.course_name, UNKNOWN_LABEL);
    assert_eq!(broken.paid_percentage, 0);
    // Still counted in the grand total.
    assert_eq!(store.total_paid_amount(), 750.0);
  }

  #[tokio::test]
  async fn refresh_failure_keeps_prior_data() {
    let svc = FakeService::new()
      .with_courses(vec![course(1, "CS", 1000.0)])
      .with_students(vec![student_in_course(7, 1)])
      .with_payments(vec![payment_on(1, 7, 500.0, Some("2024-01-01"))]);

    let mut store = PaymentStore::new();
    store.refresh(&svc).await;

    svc.fail_requests(true);
    store.refresh(&svc).await;

    assert_eq!(store.payments().len(), 1);
    assert_eq!(store.total_paid_amount(), 500.0);
    assert!(!store.is_loading());
  }

  #[tokio::test]
  async fn payments_sort_descending_and_undated_sink() {
    let svc = FakeService::new()
      .with_courses(vec![course(1, "CS", 1000.0)])
      .with_students(vec![student_in_course(7, 1)])
      .with_payments(vec![
        payment_on(1, 7, 100.0, Some("2024-01-01")),
        payment_on(2, 7, 200.0, None),
        payment_on(3, 7, 300.0, Some("2024-03-01")),
      ]);

    let mut store = PaymentStore::new();
    store.refresh(&svc).await;

    let ids: Vec<i64> = store.payments().iter().map(|p| p.payment_id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(store.latest_payments().len(), 3);
    assert_eq!(store.latest_payments()[0].payment_id, 3);
  }

  #[tokio::test]
  async fn latest_is_capped_at_three() {
    let svc = FakeService::new()
      .with_courses(vec![course(1, "CS", 1000.0)])
      .with_students(vec![student_in_course(7, 1)])
      .with_payments(vec![
        payment_on(1, 7, 1.0, Some("2024-01-01")),
        payment_on(2, 7, 2.0, Some("2024-01-02")),
        payment_on(3, 7, 3.0, Some("2024-01-03")),
        payment_on(4, 7, 4.0, Some("2024-01-04")),
      ]);

    let mut store = PaymentStore::new();
    store.refresh(&svc).await;

    assert_eq!(store.latest_payments().len(), 3);
    let ids: Vec<i64> = store.latest_payments().iter().map(|p| p.payment_id).collect();
    assert_eq!(ids, vec![4, 3, 2]);
  }

  #[test]
  fn series_has_ten_increasing_buckets_ending_today() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let series = daily_fees(&[], today);

    assert_eq!(series.len(), 10);
    assert_eq!(series.last().unwrap().date, today);
    for pair in series.windows(2) {
      assert!(pair[0].date < pair[1].date);
    }
    assert!(series.iter().all(|b| b.fees == 0.0));
  }

  #[test]
  fn series_sums_in_window_and_drops_outside() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let payments = vec![
      payment_on(1, 7, 100.0, Some("2024-06-15")),
      payment_on(2, 7, 50.0, Some("2024-06-15")),
      payment_on(3, 7, 75.0, Some("2024-06-06")), // oldest bucket
      payment_on(4, 7, 999.0, Some("2024-06-05")), // outside window
      payment_on(5, 7, 10.0, None),                // undated
    ];

    let series = daily_fees(&payments, today);
    let bucket_sum: f64 = series.iter().map(|b| b.fees).sum();
    let total: f64 = payments.iter().map(|p| p.amount_paid).sum();

    assert_eq!(series.last().unwrap().fees, 150.0);
    assert_eq!(series.first().unwrap().fees, 75.0);
    assert_eq!(bucket_sum, 225.0);
    assert!(bucket_sum <= total);
  }

  #[tokio::test]
  async fn create_appends_enriches_and_recomputes() {
    let svc = FakeService::new()
      .with_courses(vec![course(1, "CS", 1000.0)])
      .with_students(vec![student_in_course(7, 1)]);

    let mut store = PaymentStore::new();
    store.refresh(&svc).await;

    let recorded = store
      .create(
        &svc,
        NewPayment {
          student_id: 7,
          amount_paid: 400.0,
          payment_mode: PaymentMode::Online,
          remarks: None,
        },
      )
      .await
      .unwrap();

    assert_eq!(recorded.student_name, "Student 7");
    assert_eq!(recorded.paid_percentage, 40);
    assert_eq!(store.payments().len(), 1);
    assert_eq!(store.total_paid_amount(), 400.0);
    // The new payment is dated today, so it lands in the last bucket.
    assert_eq!(store.daily_fees().last().unwrap().fees, 400.0);
  }

  #[tokio::test]
  async fn overpayment_is_accepted_and_exceeds_hundred_percent() {
    let svc = FakeService::new()
      .with_courses(vec![course(1, "CS", 1000.0)])
      .with_students(vec![student_in_course(7, 1)]);

    let mut store = PaymentStore::new();
    let recorded = store
      .create(
        &svc,
        NewPayment {
          student_id: 7,
          amount_paid: 1500.0,
          payment_mode: PaymentMode::Cash,
          remarks: Some("full and advance".into()),
        },
      )
      .await
      .unwrap();

    assert_eq!(recorded.paid_percentage, 150);
    assert_eq!(store.payments().len(), 1);
  }

  #[tokio::test]
  async fn for_student_enriches_from_single_lookup() {
    let svc = FakeService::new()
      .with_courses(vec![course(1, "CS", 1000.0)])
      .with_students(vec![student_in_course(7, 1)])
      .with_payments(vec![
        payment_on(1, 7, 500.0, Some(&day_str(0))),
        payment_on(2, 7, 250.0, Some(&day_str(1))),
      ]);

    let store = PaymentStore::new();
    let history = store.for_student(&svc, 7).await.unwrap();

    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|p| p.student_name == "Student 7"));
    assert!(history.iter().all(|p| p.course_name == "CS"));
    assert_eq!(history[0].paid_percentage, 50);

    let missing = store.for_student(&svc, 99).await;
    assert!(missing.is_err());
  }
}

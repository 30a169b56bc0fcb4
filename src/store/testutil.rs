//! In-memory [`RecordService`] implementation for store tests, with call
//! counters for asserting refetch behavior.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};

use crate::api::service::RecordService;
use crate::api::types::{
  Admin, AdminUpdate, Course, CourseUpdate, NewCourse, NewPayment, NewStudent, Payment,
  PaymentMode, Student, StudentUpdate, UpdatedStudents, UNKNOWN_LABEL,
};

pub struct FakeService {
  courses: Mutex<Vec<Course>>,
  students: Mutex<Vec<Student>>,
  payments: Mutex<Vec<Payment>>,
  fail: AtomicBool,
  collection_on_update: AtomicBool,
  course_lists: AtomicUsize,
  student_lists: AtomicUsize,
}

impl FakeService {
  pub fn new() -> Self {
    Self {
      courses: Mutex::new(Vec::new()),
      students: Mutex::new(Vec::new()),
      payments: Mutex::new(Vec::new()),
      fail: AtomicBool::new(false),
      collection_on_update: AtomicBool::new(false),
      course_lists: AtomicUsize::new(0),
      student_lists: AtomicUsize::new(0),
    }
  }

  pub fn with_courses(self, courses: Vec<Course>) -> Self {
    *self.courses.lock().unwrap() = courses;
    self
  }

  pub fn with_students(self, students: Vec<Student>) -> Self {
    *self.students.lock().unwrap() = students;
    self
  }

  pub fn with_payments(self, payments: Vec<Payment>) -> Self {
    *self.payments.lock().unwrap() = payments;
    self
  }

  /// Make every subsequent request fail.
  pub fn fail_requests(&self, fail: bool) {
    self.fail.store(fail, Ordering::SeqCst);
  }

  /// Make student updates answer with the full collection instead of the
  /// single record.
  pub fn return_collection_on_update(&self, on: bool) {
    self.collection_on_update.store(on, Ordering::SeqCst);
  }

  pub fn course_list_calls(&self) -> usize {
    self.course_lists.load(Ordering::SeqCst)
  }

  pub fn student_list_calls(&self) -> usize {
    self.student_lists.load(Ordering::SeqCst)
  }

  fn check(&self) -> Result<()> {
    if self.fail.load(Ordering::SeqCst) {
      Err(eyre!("simulated network failure"))
    } else {
      Ok(())
    }
  }
}

impl RecordService for FakeService {
  async fn login(&self, email: String, password: String) -> Result<Admin> {
    self.check()?;
    if password == "secret" {
      Ok(Admin {
        admin_id: 1,
        email,
        created_at: None,
        updated_at: None,
      })
    } else {
      Err(eyre!("Invalid email or password"))
    }
  }

  async fn update_admin(&self, id: i64, update: AdminUpdate) -> Result<Admin> {
    self.check()?;
    Ok(Admin {
      admin_id: id,
      email: update.email.unwrap_or_else(|| "admin@school.test".into()),
      created_at: None,
      updated_at: None,
    })
  }

  async fn list_courses(&self) -> Result<Vec<Course>> {
    self.course_lists.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    Ok(self.courses.lock().unwrap().clone())
  }

  async fn get_course(&self, id: i64) -> Result<Option<Course>> {
    self.check()?;
    Ok(
      self
        .courses
        .lock()
        .unwrap()
        .iter()
        .find(|c| c.course_id == id)
        .cloned(),
    )
  }

  async fn create_course(&self, new: NewCourse) -> Result<Course> {
    self.check()?;
    let mut courses = self.courses.lock().unwrap();
    let course = Course {
      course_id: courses.iter().map(|c| c.course_id).max().unwrap_or(0) + 1,
      course_name: new.course_name,
      semester: new.semester,
      fee_amount: new.fee_amount,
    };
    courses.push(course.clone());
    Ok(course)
  }

  async fn update_course(&self, id: i64, update: CourseUpdate) -> Result<Course> {
    self.check()?;
    let mut courses = self.courses.lock().unwrap();
    let course = courses
      .iter_mut()
      .find(|c| c.course_id == id)
      .ok_or_else(|| eyre!("Course not found"))?;
    if let Some(name) = update.course_name {
      course.course_name = name;
    }
    if let Some(semester) = update.semester {
      course.semester = semester;
    }
    if let Some(fee) = update.fee_amount {
      course.fee_amount = fee;
    }
    Ok(course.clone())
  }

  async fn delete_course(&self, id: i64) -> Result<()> {
    self.check()?;
    self.courses.lock().unwrap().retain(|c| c.course_id != id);
    Ok(())
  }

  async fn list_students(&self) -> Result<Vec<Student>> {
    self.student_lists.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    Ok(self.students.lock().unwrap().clone())
  }

  async fn get_student(&self, id: i64) -> Result<Option<Student>> {
    self.check()?;
    Ok(
      self
        .students
        .lock()
        .unwrap()
        .iter()
        .find(|s| s.student_id == id)
        .cloned(),
    )
  }

  async fn create_student(&self, new: NewStudent) -> Result<Student> {
    self.check()?;
    let fee = self
      .courses
      .lock()
      .unwrap()
      .iter()
      .find(|c| c.course_id == new.course_id)
      .map(|c| c.fee_amount);

    let mut students = self.students.lock().unwrap();
    let student = Student {
      student_id: students.iter().map(|s| s.student_id).max().unwrap_or(0) + 1,
      full_name: new.full_name,
      roll_no: new.roll_no,
      contact_no: new.contact_no,
      parent_name: new.parent_name,
      course_id: new.course_id,
      course_name: UNKNOWN_LABEL.to_string(),
      total_fee: fee,
      paid_fee: 0.0,
      pending_fee: fee.unwrap_or(0.0),
      admission_date: new.admission_date,
      last_payment_date: None,
    };
    students.push(student.clone());
    Ok(student)
  }

  async fn update_student(&self, id: i64, update: StudentUpdate) -> Result<UpdatedStudents> {
    self.check()?;
    let mut students = self.students.lock().unwrap();
    let student = students
      .iter_mut()
      .find(|s| s.student_id == id)
      .ok_or_else(|| eyre!("Student not found"))?;
    if let Some(name) = update.full_name {
      student.full_name = name;
    }
    if let Some(roll) = update.roll_no {
      student.roll_no = roll;
    }
    if let Some(contact) = update.contact_no {
      student.contact_no = contact;
    }
    if let Some(parent) = update.parent_name {
      student.parent_name = parent;
    }
    if let Some(course_id) = update.course_id {
      student.course_id = course_id;
    }
    let updated = student.clone();

    if self.collection_on_update.load(Ordering::SeqCst) {
      Ok(UpdatedStudents::All(students.clone()))
    } else {
      Ok(UpdatedStudents::One(updated))
    }
  }

  async fn delete_student(&self, id: i64) -> Result<()> {
    self.check()?;
    self
      .students
      .lock()
      .unwrap()
      .retain(|s| s.student_id != id);
    Ok(())
  }

  async fn list_payments(&self) -> Result<Vec<Payment>> {
    self.check()?;
    Ok(self.payments.lock().unwrap().clone())
  }

  async fn create_payment(&self, new: NewPayment) -> Result<Payment> {
    self.check()?;
    let date = Utc::now().date_naive().format("%Y-%m-%d").to_string();

    // Server side effect: the student's paid/pending figures move.
    {
      let mut students = self.students.lock().unwrap();
      if let Some(student) = students.iter_mut().find(|s| s.student_id == new.student_id) {
        student.paid_fee += new.amount_paid;
        student.pending_fee -= new.amount_paid;
        student.last_payment_date = Some(date.clone());
      }
    }

    let mut payments = self.payments.lock().unwrap();
    let payment = Payment {
      payment_id: payments.iter().map(|p| p.payment_id).max().unwrap_or(0) + 1,
      student_id: new.student_id,
      student_name: UNKNOWN_LABEL.to_string(),
      course_name: UNKNOWN_LABEL.to_string(),
      amount_paid: new.amount_paid,
      total_fee: None,
      paid_percentage: 0,
      payment_mode: new.payment_mode,
      remarks: new.remarks,
      payment_date: Some(date),
    };
    payments.push(payment.clone());
    Ok(payment)
  }

  async fn payments_by_student(&self, student_id: i64) -> Result<Vec<Payment>> {
    self.check()?;
    Ok(
      self
        .payments
        .lock()
        .unwrap()
        .iter()
        .filter(|p| p.student_id == student_id)
        .cloned()
        .collect(),
    )
  }
}

// ── Record builders ──────────────────────────────────────────────────────────

pub fn course(id: i64, name: &str, fee: f64) -> Course {
  Course {
    course_id: id,
    course_name: name.to_string(),
    semester: 1,
    fee_amount: fee,
  }
}

pub fn student_in_course(id: i64, course_id: i64) -> Student {
  Student {
    student_id: id,
    full_name: format!("Student {id}"),
    roll_no: format!("R-{id:03}"),
    contact_no: "555-0100".into(),
    parent_name: "Parent".into(),
    course_id,
    course_name: UNKNOWN_LABEL.to_string(),
    total_fee: None,
    paid_fee: 0.0,
    pending_fee: 0.0,
    admission_date: None,
    last_payment_date: None,
  }
}

/// A payment as the server would return it: enrichment fields at their
/// sentinels.
pub fn payment_on(id: i64, student_id: i64, amount: f64, date: Option<&str>) -> Payment {
  Payment {
    payment_id: id,
    student_id,
    student_name: UNKNOWN_LABEL.to_string(),
    course_name: UNKNOWN_LABEL.to_string(),
    amount_paid: amount,
    total_fee: None,
    paid_percentage: 0,
    payment_mode: PaymentMode::Cash,
    remarks: None,
    payment_date: date.map(String::from),
  }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursemart_core::{Amount, CourseId, PrincipalId};
use coursemart_marketplace::{Course, Enrollment, PendingSettlement, Student};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub price: Amount,
}

#[derive(Debug, Deserialize)]
pub struct RegisterStudentRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteCourseRequest {
    /// Validated by the ledger (`1..=5`); anything outside `u8` is rejected by JSON parsing.
    pub rating: u8,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub instructor: PrincipalId,
    pub price: Amount,
    pub enrolled_count: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Course> for CourseResponse {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            instructor: c.instructor,
            price: c.price,
            enrolled_count: c.enrolled_count,
            is_active: c.is_active,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub principal: PrincipalId,
    pub name: String,
    pub enrolled_courses: Vec<CourseId>,
    pub total_courses_completed: u64,
    pub joined_at: DateTime<Utc>,
}

impl From<Student> for StudentResponse {
    fn from(s: Student) -> Self {
        Self {
            principal: s.principal,
            name: s.name,
            enrolled_courses: s.enrolled_courses,
            total_courses_completed: s.total_courses_completed,
            joined_at: s.joined_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub course_id: CourseId,
    pub student: PrincipalId,
    pub enrolled_at: DateTime<Utc>,
    pub is_completed: bool,
    /// `0` until the course is completed.
    pub rating: u8,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(e: Enrollment) -> Self {
        Self {
            course_id: e.course_id(),
            student: e.student(),
            enrolled_at: e.enrolled_at,
            is_completed: e.is_completed,
            rating: e.rating_value(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EarningsResponse {
    pub principal: PrincipalId,
    pub earnings: Amount,
}

#[derive(Debug, Serialize)]
pub struct AmountResponse {
    pub amount: Amount,
}

#[derive(Debug, Serialize)]
pub struct CourseStatusResponse {
    pub id: CourseId,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct PendingSettlementsResponse {
    pub pending: Vec<PendingSettlement>,
}

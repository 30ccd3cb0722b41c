use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursemart_core::{Amount, CourseId, Entity, PrincipalId, Rating};

/// A course offered by an instructor.
///
/// `instructor` and `price` are fixed at creation. `enrolled_count` only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub instructor: PrincipalId,
    pub price: Amount,
    pub enrolled_count: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Course {
    type Id = CourseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A registered student, keyed by their own principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub principal: PrincipalId,
    pub name: String,
    /// Append-only, in enrollment order.
    pub enrolled_courses: Vec<CourseId>,
    pub total_courses_completed: u64,
    pub joined_at: DateTime<Utc>,
}

impl Entity for Student {
    type Id = PrincipalId;

    fn id(&self) -> &Self::Id {
        &self.principal
    }
}

/// Key of an enrollment: at most one per (course, student).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnrollmentKey {
    pub course_id: CourseId,
    pub student: PrincipalId,
}

impl EnrollmentKey {
    pub fn new(course_id: CourseId, student: PrincipalId) -> Self {
        Self { course_id, student }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub key: EnrollmentKey,
    pub enrolled_at: DateTime<Utc>,
    pub is_completed: bool,
    /// Set exactly once, together with `is_completed`.
    pub rating: Option<Rating>,
}

impl Enrollment {
    pub fn course_id(&self) -> CourseId {
        self.key.course_id
    }

    pub fn student(&self) -> PrincipalId {
        self.key.student
    }

    /// Rating as a plain number, `0` while unset.
    pub fn rating_value(&self) -> u8 {
        self.rating.map(Rating::get).unwrap_or(0)
    }
}

impl Entity for Enrollment {
    type Id = EnrollmentKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}

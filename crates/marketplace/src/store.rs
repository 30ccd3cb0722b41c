//! Ledger Store: the authoritative, strongly-typed key-value substrate.
//!
//! No validation lives here. The `Ledger` aggregate is the only writer and
//! only writes from `apply`, after `handle` has accepted a command.

use std::collections::{BTreeMap, HashMap, HashSet};

use coursemart_core::{Amount, CourseId, Entity, PrincipalId};

use crate::model::{Course, Enrollment, EnrollmentKey, Student};
use crate::settlement::PendingSettlement;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerStore {
    owner: Option<PrincipalId>,
    courses: BTreeMap<CourseId, Course>,
    students: HashMap<PrincipalId, Student>,
    registered: HashSet<PrincipalId>,
    enrollments: HashMap<EnrollmentKey, Enrollment>,
    earnings: HashMap<PrincipalId, Amount>,
    total_courses: u64,
    total_students: u64,
    pending_settlements: BTreeMap<u64, PendingSettlement>,
    next_settlement_id: u64,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Option<PrincipalId> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: PrincipalId) {
        self.owner = Some(owner);
    }

    // Courses

    pub fn course(&self, id: CourseId) -> Option<&Course> {
        self.courses.get(&id)
    }

    pub fn course_mut(&mut self, id: CourseId) -> Option<&mut Course> {
        self.courses.get_mut(&id)
    }

    pub fn insert_course(&mut self, course: Course) {
        self.courses.insert(*course.id(), course);
    }

    /// All courses in id order.
    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    // Students

    pub fn student(&self, principal: PrincipalId) -> Option<&Student> {
        self.students.get(&principal)
    }

    pub fn student_mut(&mut self, principal: PrincipalId) -> Option<&mut Student> {
        self.students.get_mut(&principal)
    }

    pub fn insert_student(&mut self, student: Student) {
        self.students.insert(*student.id(), student);
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    pub fn is_registered(&self, principal: PrincipalId) -> bool {
        self.registered.contains(&principal)
    }

    pub fn mark_registered(&mut self, principal: PrincipalId) {
        self.registered.insert(principal);
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    // Enrollments

    pub fn enrollment(&self, key: &EnrollmentKey) -> Option<&Enrollment> {
        self.enrollments.get(key)
    }

    pub fn enrollment_mut(&mut self, key: &EnrollmentKey) -> Option<&mut Enrollment> {
        self.enrollments.get_mut(key)
    }

    pub fn insert_enrollment(&mut self, enrollment: Enrollment) {
        self.enrollments.insert(*enrollment.id(), enrollment);
    }

    pub fn enrollments(&self) -> impl Iterator<Item = &Enrollment> {
        self.enrollments.values()
    }

    // Earnings

    /// Balance for `principal`; zero if nothing was ever credited.
    pub fn earnings(&self, principal: PrincipalId) -> Amount {
        self.earnings.get(&principal).copied().unwrap_or(0)
    }

    pub fn set_earnings(&mut self, principal: PrincipalId, amount: Amount) {
        self.earnings.insert(principal, amount);
    }

    pub fn earnings_entries(&self) -> impl Iterator<Item = (&PrincipalId, &Amount)> {
        self.earnings.iter()
    }

    // Pending settlements

    pub fn pending_settlement(&self, id: u64) -> Option<&PendingSettlement> {
        self.pending_settlements.get(&id)
    }

    /// Oldest first.
    pub fn pending_settlements(&self) -> impl Iterator<Item = &PendingSettlement> {
        self.pending_settlements.values()
    }

    /// Id the next queued settlement will receive.
    pub fn next_settlement_id(&self) -> u64 {
        self.next_settlement_id
    }

    pub fn queue_settlement(&mut self, settlement: PendingSettlement) {
        self.next_settlement_id = settlement.id + 1;
        self.pending_settlements.insert(settlement.id, settlement);
    }

    pub fn remove_pending_settlement(&mut self, id: u64) -> Option<PendingSettlement> {
        self.pending_settlements.remove(&id)
    }

    // Counters

    pub fn total_courses(&self) -> u64 {
        self.total_courses
    }

    pub fn set_total_courses(&mut self, total: u64) {
        self.total_courses = total;
    }

    pub fn total_students(&self) -> u64 {
        self.total_students
    }

    pub fn set_total_students(&mut self, total: u64) {
        self.total_students = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::SettlementInstruction;
    use chrono::Utc;

    #[test]
    fn reads_reflect_latest_write() {
        let mut store = LedgerStore::new();
        let instructor = PrincipalId::new();

        assert_eq!(store.earnings(instructor), 0);
        store.set_earnings(instructor, 40);
        store.set_earnings(instructor, 90);
        assert_eq!(store.earnings(instructor), 90);

        store.insert_course(Course {
            id: CourseId::new(1),
            title: "Algebra".to_string(),
            description: "Linear equations".to_string(),
            instructor,
            price: 100,
            enrolled_count: 0,
            is_active: true,
            created_at: Utc::now(),
        });
        store.course_mut(CourseId::new(1)).unwrap().is_active = false;
        assert!(!store.course(CourseId::new(1)).unwrap().is_active);
        assert!(store.course(CourseId::new(2)).is_none());
    }

    #[test]
    fn settlement_ids_advance_past_removed_entries() {
        let mut store = LedgerStore::new();
        let to = PrincipalId::new();
        for _ in 0..2 {
            store.queue_settlement(PendingSettlement {
                id: store.next_settlement_id(),
                instruction: SettlementInstruction::Payout { to, amount: 10 },
                queued_at: Utc::now(),
            });
        }
        assert!(store.remove_pending_settlement(1).is_some());
        assert!(store.remove_pending_settlement(1).is_none());
        assert_eq!(store.next_settlement_id(), 2);
        assert_eq!(
            store.pending_settlements().map(|p| p.id).collect::<Vec<_>>(),
            vec![0]
        );
    }

    #[test]
    fn registration_flag_is_independent_of_counters() {
        let mut store = LedgerStore::new();
        let p = PrincipalId::new();
        store.mark_registered(p);
        assert!(store.is_registered(p));
        assert_eq!(store.total_students(), 0);
        assert_eq!(store.registered_count(), 1);
    }
}

use serde::Serialize;

use coursemart_events::Event;

use coursemart_core::{
    Aggregate, AggregateRoot, Amount, CourseId, LedgerError, LedgerId, LedgerResult, PrincipalId,
    Rating,
};

use crate::command::{
    CompleteCourse, CompleteSettlement, CreateCourse, DirectPayment, EmergencyWithdraw,
    EnrollInCourse, LedgerCommand, OpenLedger, RegisterStudent, ToggleCourseStatus,
    WithdrawEarnings,
};
use crate::event::{
    CourseCompleted, CourseCreated, CourseEnrolled, CourseStatusToggled, EarningsWithdrawn,
    EmergencySweepRequested, LedgerEvent, LedgerOpened, SettlementCompleted, StudentRegistered,
};
use crate::model::{Course, Enrollment, EnrollmentKey, Student};
use crate::settlement::PendingSettlement;
use crate::store::LedgerStore;

/// Aggregate root: the marketplace ledger.
///
/// One instance owns one `LedgerStore`. `handle` checks every precondition of
/// a command and decides events; `apply` is the only code that writes to the
/// store. Version is the number of applied events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    id: LedgerId,
    store: LedgerStore,
    version: u64,
    opened: bool,
}

/// Public counters and identity of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub ledger_id: LedgerId,
    pub owner: Option<PrincipalId>,
    pub total_courses: u64,
    pub total_students: u64,
    pub pending_settlements: u64,
    pub version: u64,
}

impl Ledger {
    /// Empty aggregate for rehydration.
    pub fn empty(id: LedgerId) -> Self {
        Self {
            id,
            store: LedgerStore::new(),
            version: 0,
            opened: false,
        }
    }

    pub fn id_typed(&self) -> LedgerId {
        self.id
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    pub fn owner(&self) -> Option<PrincipalId> {
        self.store.owner()
    }

    /// Read-only view of the underlying store.
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries (no side effects)
    // ─────────────────────────────────────────────────────────────────────

    pub fn get_course(&self, course_id: CourseId) -> LedgerResult<&Course> {
        self.valid_course(course_id).map_err(|_| LedgerError::NotFound)
    }

    pub fn get_student_courses(&self, student: PrincipalId) -> LedgerResult<&[CourseId]> {
        self.get_student(student).map(|s| s.enrolled_courses.as_slice())
    }

    pub fn get_student(&self, student: PrincipalId) -> LedgerResult<&Student> {
        self.store.student(student).ok_or(LedgerError::NotFound)
    }

    pub fn get_enrollment(
        &self,
        course_id: CourseId,
        student: PrincipalId,
    ) -> LedgerResult<&Enrollment> {
        self.store
            .enrollment(&EnrollmentKey::new(course_id, student))
            .ok_or(LedgerError::NotFound)
    }

    pub fn earnings_of(&self, principal: PrincipalId) -> Amount {
        self.store.earnings(principal)
    }

    pub fn is_registered(&self, principal: PrincipalId) -> bool {
        self.store.is_registered(principal)
    }

    pub fn total_courses(&self) -> u64 {
        self.store.total_courses()
    }

    pub fn total_students(&self) -> u64 {
        self.store.total_students()
    }

    /// Settlements decided by committed events that have not run yet.
    pub fn pending_settlements(&self) -> Vec<PendingSettlement> {
        self.store.pending_settlements().copied().collect()
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            ledger_id: self.id,
            owner: self.store.owner(),
            total_courses: self.store.total_courses(),
            total_students: self.store.total_students(),
            pending_settlements: self.store.pending_settlements().count() as u64,
            version: self.version,
        }
    }
}

impl AggregateRoot for Ledger {
    type Id = LedgerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for Ledger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = LedgerError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::LedgerOpened(e) => {
                self.id = e.ledger_id;
                self.store.set_owner(e.owner);
                self.opened = true;
            }
            LedgerEvent::CourseCreated(e) => {
                self.store.insert_course(Course {
                    id: e.course_id,
                    title: e.title.clone(),
                    description: e.description.clone(),
                    instructor: e.instructor,
                    price: e.price,
                    enrolled_count: 0,
                    is_active: true,
                    created_at: e.occurred_at,
                });
                self.store.set_total_courses(e.course_id.get());
            }
            LedgerEvent::StudentRegistered(e) => {
                self.store.insert_student(Student {
                    principal: e.student,
                    name: e.name.clone(),
                    enrolled_courses: Vec::new(),
                    total_courses_completed: 0,
                    joined_at: e.occurred_at,
                });
                self.store.mark_registered(e.student);
                let total = self.store.total_students();
                self.store.set_total_students(total + 1);
            }
            LedgerEvent::CourseEnrolled(e) => {
                self.store.insert_enrollment(Enrollment {
                    key: EnrollmentKey::new(e.course_id, e.student),
                    enrolled_at: e.occurred_at,
                    is_completed: false,
                    rating: None,
                });
                if let Some(student) = self.store.student_mut(e.student) {
                    student.enrolled_courses.push(e.course_id);
                }
                if let Some(course) = self.store.course_mut(e.course_id) {
                    course.enrolled_count += 1;
                }
                // Overflow was ruled out when the command was handled.
                let balance = self.store.earnings(e.instructor).saturating_add(e.price);
                self.store.set_earnings(e.instructor, balance);
            }
            LedgerEvent::CourseCompleted(e) => {
                let key = EnrollmentKey::new(e.course_id, e.student);
                if let Some(enrollment) = self.store.enrollment_mut(&key) {
                    enrollment.is_completed = true;
                    enrollment.rating = Some(e.rating);
                }
                if let Some(student) = self.store.student_mut(e.student) {
                    student.total_courses_completed += 1;
                }
            }
            LedgerEvent::CourseStatusToggled(e) => {
                if let Some(course) = self.store.course_mut(e.course_id) {
                    course.is_active = e.is_active;
                }
            }
            LedgerEvent::EarningsWithdrawn(e) => {
                self.store.set_earnings(e.instructor, 0);
            }
            LedgerEvent::EmergencySweepRequested(_) => {}
            LedgerEvent::SettlementCompleted(e) => {
                self.store.remove_pending_settlement(e.settlement_id);
            }
        }

        for instruction in event.settlement_instructions() {
            self.store.queue_settlement(PendingSettlement {
                id: self.store.next_settlement_id(),
                instruction,
                queued_at: event.occurred_at(),
            });
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if let LedgerCommand::OpenLedger(cmd) = command {
            return self.handle_open(cmd);
        }
        if !self.opened {
            return Err(LedgerError::LedgerNotOpened);
        }

        match command {
            LedgerCommand::OpenLedger(_) => Err(LedgerError::LedgerAlreadyOpened),
            LedgerCommand::CreateCourse(cmd) => self.handle_create_course(cmd),
            LedgerCommand::RegisterStudent(cmd) => self.handle_register(cmd),
            LedgerCommand::EnrollInCourse(cmd) => self.handle_enroll(cmd),
            LedgerCommand::CompleteCourse(cmd) => self.handle_complete(cmd),
            LedgerCommand::ToggleCourseStatus(cmd) => self.handle_toggle(cmd),
            LedgerCommand::WithdrawEarnings(cmd) => self.handle_withdraw(cmd),
            LedgerCommand::EmergencyWithdraw(cmd) => self.handle_emergency(cmd),
            LedgerCommand::DirectPayment(cmd) => self.handle_direct_payment(cmd),
            LedgerCommand::CompleteSettlement(cmd) => self.handle_complete_settlement(cmd),
        }
    }
}

fn ensure_non_empty(field: &'static str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        return Err(LedgerError::EmptyField(field));
    }
    Ok(())
}

impl Ledger {
    /// Course ids are valid exactly in `1..=total_courses`.
    fn valid_course(&self, course_id: CourseId) -> Result<&Course, LedgerError> {
        let id = course_id.get();
        if id == 0 || id > self.store.total_courses() {
            return Err(LedgerError::CourseNotFound(course_id));
        }
        self.store
            .course(course_id)
            .ok_or(LedgerError::CourseNotFound(course_id))
    }

    fn ensure_registered(&self, principal: PrincipalId) -> Result<(), LedgerError> {
        if !self.store.is_registered(principal) {
            return Err(LedgerError::NotRegistered);
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenLedger) -> Result<Vec<LedgerEvent>, LedgerError> {
        if self.opened {
            return Err(LedgerError::LedgerAlreadyOpened);
        }

        Ok(vec![LedgerEvent::LedgerOpened(LedgerOpened {
            ledger_id: cmd.ledger_id,
            owner: cmd.owner,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_create_course(&self, cmd: &CreateCourse) -> Result<Vec<LedgerEvent>, LedgerError> {
        ensure_non_empty("title", &cmd.title)?;
        ensure_non_empty("description", &cmd.description)?;
        if cmd.price == 0 {
            return Err(LedgerError::InvalidPrice);
        }

        let course_id = CourseId::new(self.store.total_courses()).next();

        Ok(vec![LedgerEvent::CourseCreated(CourseCreated {
            course_id,
            title: cmd.title.clone(),
            description: cmd.description.clone(),
            instructor: cmd.caller,
            price: cmd.price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_register(&self, cmd: &RegisterStudent) -> Result<Vec<LedgerEvent>, LedgerError> {
        if self.store.is_registered(cmd.caller) {
            return Err(LedgerError::AlreadyRegistered);
        }
        ensure_non_empty("name", &cmd.name)?;

        Ok(vec![LedgerEvent::StudentRegistered(StudentRegistered {
            student: cmd.caller,
            name: cmd.name.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_enroll(&self, cmd: &EnrollInCourse) -> Result<Vec<LedgerEvent>, LedgerError> {
        let course = self.valid_course(cmd.course_id)?;
        self.ensure_registered(cmd.caller)?;

        // Checked before activity and payment so a repeat enrollment always
        // reports AlreadyEnrolled, whatever amount is attached.
        let key = EnrollmentKey::new(cmd.course_id, cmd.caller);
        if self.store.enrollment(&key).is_some() {
            return Err(LedgerError::AlreadyEnrolled(cmd.course_id));
        }
        if !course.is_active {
            return Err(LedgerError::CourseInactive(cmd.course_id));
        }
        if cmd.attached_amount < course.price {
            return Err(LedgerError::InsufficientPayment {
                price: course.price,
                attached: cmd.attached_amount,
            });
        }
        self.store
            .earnings(course.instructor)
            .checked_add(course.price)
            .ok_or(LedgerError::AmountOverflow)?;

        Ok(vec![LedgerEvent::CourseEnrolled(CourseEnrolled {
            course_id: cmd.course_id,
            student: cmd.caller,
            instructor: course.instructor,
            price: course.price,
            attached_amount: cmd.attached_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(&self, cmd: &CompleteCourse) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.valid_course(cmd.course_id)?;
        self.ensure_registered(cmd.caller)?;
        let rating = Rating::new(cmd.rating)?;

        let key = EnrollmentKey::new(cmd.course_id, cmd.caller);
        let enrollment = self
            .store
            .enrollment(&key)
            .ok_or(LedgerError::NotEnrolled(cmd.course_id))?;
        if enrollment.is_completed {
            return Err(LedgerError::AlreadyCompleted(cmd.course_id));
        }

        Ok(vec![LedgerEvent::CourseCompleted(CourseCompleted {
            course_id: cmd.course_id,
            student: cmd.caller,
            rating,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_toggle(&self, cmd: &ToggleCourseStatus) -> Result<Vec<LedgerEvent>, LedgerError> {
        let course = self.valid_course(cmd.course_id)?;
        if course.instructor != cmd.caller {
            return Err(LedgerError::NotInstructor(cmd.course_id));
        }

        Ok(vec![LedgerEvent::CourseStatusToggled(CourseStatusToggled {
            course_id: cmd.course_id,
            instructor: cmd.caller,
            is_active: !course.is_active,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_withdraw(&self, cmd: &WithdrawEarnings) -> Result<Vec<LedgerEvent>, LedgerError> {
        let balance = self.store.earnings(cmd.caller);
        if balance == 0 {
            return Err(LedgerError::NoEarnings);
        }

        Ok(vec![LedgerEvent::EarningsWithdrawn(EarningsWithdrawn {
            instructor: cmd.caller,
            amount: balance,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_emergency(&self, cmd: &EmergencyWithdraw) -> Result<Vec<LedgerEvent>, LedgerError> {
        if self.store.owner() != Some(cmd.caller) {
            return Err(LedgerError::NotOwner);
        }

        Ok(vec![LedgerEvent::EmergencySweepRequested(
            EmergencySweepRequested {
                owner: cmd.caller,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_direct_payment(&self, _cmd: &DirectPayment) -> Result<Vec<LedgerEvent>, LedgerError> {
        Err(LedgerError::UnsupportedDirectPayment)
    }

    fn handle_complete_settlement(
        &self,
        cmd: &CompleteSettlement,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        if self.store.pending_settlement(cmd.settlement_id).is_none() {
            return Err(LedgerError::SettlementNotPending(cmd.settlement_id));
        }

        Ok(vec![LedgerEvent::SettlementCompleted(SettlementCompleted {
            settlement_id: cmd.settlement_id,
            amount: cmd.amount,
            occurred_at: cmd.occurred_at,
        })])
    }
}

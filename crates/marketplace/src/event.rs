use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursemart_core::{Amount, CourseId, LedgerId, PrincipalId, Rating};
use coursemart_events::Event;

/// Event: LedgerOpened (always the first journal entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOpened {
    pub ledger_id: LedgerId,
    pub owner: PrincipalId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CourseCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCreated {
    pub course_id: CourseId,
    pub title: String,
    pub description: String,
    pub instructor: PrincipalId,
    pub price: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StudentRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRegistered {
    pub student: PrincipalId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CourseEnrolled.
///
/// `price` is what the instructor is credited; `attached_amount` is what the
/// student sent. The difference is refunded by settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEnrolled {
    pub course_id: CourseId,
    pub student: PrincipalId,
    pub instructor: PrincipalId,
    pub price: Amount,
    pub attached_amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

impl CourseEnrolled {
    /// Overpayment owed back to the student.
    pub fn refund_due(&self) -> Amount {
        self.attached_amount.saturating_sub(self.price)
    }
}

/// Event: CourseCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCompleted {
    pub course_id: CourseId,
    pub student: PrincipalId,
    pub rating: Rating,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CourseStatusToggled. `is_active` is the status after the toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseStatusToggled {
    pub course_id: CourseId,
    pub instructor: PrincipalId,
    pub is_active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EarningsWithdrawn. `amount` is the full balance, now zeroed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsWithdrawn {
    pub instructor: PrincipalId,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EmergencySweepRequested. Leaves per-instructor balances untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencySweepRequested {
    pub owner: PrincipalId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SettlementCompleted. Clears a pending settlement once it has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementCompleted {
    pub settlement_id: u64,
    /// Amount actually moved (a sweep moves whatever custody held).
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    LedgerOpened(LedgerOpened),
    CourseCreated(CourseCreated),
    StudentRegistered(StudentRegistered),
    CourseEnrolled(CourseEnrolled),
    CourseCompleted(CourseCompleted),
    CourseStatusToggled(CourseStatusToggled),
    EarningsWithdrawn(EarningsWithdrawn),
    EmergencySweepRequested(EmergencySweepRequested),
    SettlementCompleted(SettlementCompleted),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::LedgerOpened(_) => "marketplace.ledger.opened",
            LedgerEvent::CourseCreated(_) => "marketplace.course.created",
            LedgerEvent::StudentRegistered(_) => "marketplace.student.registered",
            LedgerEvent::CourseEnrolled(_) => "marketplace.course.enrolled",
            LedgerEvent::CourseCompleted(_) => "marketplace.course.completed",
            LedgerEvent::CourseStatusToggled(_) => "marketplace.course.status_toggled",
            LedgerEvent::EarningsWithdrawn(_) => "marketplace.earnings.withdrawn",
            LedgerEvent::EmergencySweepRequested(_) => {
                "marketplace.ledger.emergency_sweep_requested"
            }
            LedgerEvent::SettlementCompleted(_) => "marketplace.settlement.completed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::LedgerOpened(e) => e.occurred_at,
            LedgerEvent::CourseCreated(e) => e.occurred_at,
            LedgerEvent::StudentRegistered(e) => e.occurred_at,
            LedgerEvent::CourseEnrolled(e) => e.occurred_at,
            LedgerEvent::CourseCompleted(e) => e.occurred_at,
            LedgerEvent::CourseStatusToggled(e) => e.occurred_at,
            LedgerEvent::EarningsWithdrawn(e) => e.occurred_at,
            LedgerEvent::EmergencySweepRequested(e) => e.occurred_at,
            LedgerEvent::SettlementCompleted(e) => e.occurred_at,
        }
    }
}

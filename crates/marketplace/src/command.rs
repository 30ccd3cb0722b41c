use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursemart_core::{Amount, CourseId, LedgerId, PrincipalId};

/// Command: OpenLedger (bootstrap; fixes the owner for the ledger's lifetime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLedger {
    pub ledger_id: LedgerId,
    pub owner: PrincipalId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CreateCourse. The caller becomes the instructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCourse {
    pub caller: PrincipalId,
    pub title: String,
    pub description: String,
    pub price: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RegisterStudent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterStudent {
    pub caller: PrincipalId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EnrollInCourse. The only command that carries value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollInCourse {
    pub caller: PrincipalId,
    pub course_id: CourseId,
    pub attached_amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteCourse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteCourse {
    pub caller: PrincipalId,
    pub course_id: CourseId,
    /// Raw rating as submitted; validated to `1..=5` by the ledger.
    pub rating: u8,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ToggleCourseStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleCourseStatus {
    pub caller: PrincipalId,
    pub course_id: CourseId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: WithdrawEarnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawEarnings {
    pub caller: PrincipalId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EmergencyWithdraw (owner only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyWithdraw {
    pub caller: PrincipalId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DirectPayment (value sent with no operation selected).
///
/// Always rejected; modelled as a command so the rejection goes through the
/// same path and logging as every other operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectPayment {
    pub caller: PrincipalId,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteSettlement. Issued by the service once a pending
/// settlement has executed; never accepted from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteSettlement {
    pub settlement_id: u64,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    OpenLedger(OpenLedger),
    CreateCourse(CreateCourse),
    RegisterStudent(RegisterStudent),
    EnrollInCourse(EnrollInCourse),
    CompleteCourse(CompleteCourse),
    ToggleCourseStatus(ToggleCourseStatus),
    WithdrawEarnings(WithdrawEarnings),
    EmergencyWithdraw(EmergencyWithdraw),
    DirectPayment(DirectPayment),
    CompleteSettlement(CompleteSettlement),
}

impl LedgerCommand {
    /// Stable operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCommand::OpenLedger(_) => "open_ledger",
            LedgerCommand::CreateCourse(_) => "create_course",
            LedgerCommand::RegisterStudent(_) => "register_student",
            LedgerCommand::EnrollInCourse(_) => "enroll_in_course",
            LedgerCommand::CompleteCourse(_) => "complete_course",
            LedgerCommand::ToggleCourseStatus(_) => "toggle_course_status",
            LedgerCommand::WithdrawEarnings(_) => "withdraw_earnings",
            LedgerCommand::EmergencyWithdraw(_) => "emergency_withdraw",
            LedgerCommand::DirectPayment(_) => "direct_payment",
            LedgerCommand::CompleteSettlement(_) => "complete_settlement",
        }
    }

    /// Whether this operation accepts value attached to the call.
    pub fn is_payable(&self) -> bool {
        matches!(self, LedgerCommand::EnrollInCourse(_))
    }
}

//! Settlement collaborator boundary.
//!
//! The ledger only does bookkeeping. Moving real value is delegated to a
//! `Settlement` implementation in two phases:
//!
//! - the value attached to an enrollment is collected before the enrollment
//!   commits, so earnings are never credited for value custody does not hold;
//! - refunds, payouts and sweeps are decided by committed events and queued in
//!   the ledger as `PendingSettlement`s until a `SettlementCompleted` event
//!   records that they ran.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursemart_core::{Amount, PrincipalId};

use crate::event::LedgerEvent;

/// A value transfer the ledger has decided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlementInstruction {
    /// Take the value attached to an accepted enrollment into custody.
    Collect { from: PrincipalId, amount: Amount },
    /// Return overpayment to a student.
    Refund { to: PrincipalId, amount: Amount },
    /// Pay a withdrawn earnings balance to an instructor.
    Payout { to: PrincipalId, amount: Amount },
    /// Move the whole custodied balance to the owner.
    Sweep { to: PrincipalId },
}

/// A post-commit instruction the ledger is still waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSettlement {
    /// Allocated in commit order, never reused.
    pub id: u64,
    pub instruction: SettlementInstruction,
    pub queued_at: DateTime<Utc>,
}

/// External value-transfer collaborator.
///
/// A failed post-commit instruction never undoes ledger state; it stays
/// pending and is executed again on retry, so implementations should treat
/// each instruction as at-least-once.
pub trait Settlement: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn collect(&self, from: PrincipalId, amount: Amount) -> Result<(), Self::Error>;

    fn refund(&self, to: PrincipalId, amount: Amount) -> Result<(), Self::Error>;

    fn payout(&self, to: PrincipalId, amount: Amount) -> Result<(), Self::Error>;

    /// Returns the amount swept.
    fn sweep(&self, to: PrincipalId) -> Result<Amount, Self::Error>;
}

impl<S> Settlement for Arc<S>
where
    S: Settlement + ?Sized,
{
    type Error = S::Error;

    fn collect(&self, from: PrincipalId, amount: Amount) -> Result<(), Self::Error> {
        (**self).collect(from, amount)
    }

    fn refund(&self, to: PrincipalId, amount: Amount) -> Result<(), Self::Error> {
        (**self).refund(to, amount)
    }

    fn payout(&self, to: PrincipalId, amount: Amount) -> Result<(), Self::Error> {
        (**self).payout(to, amount)
    }

    fn sweep(&self, to: PrincipalId) -> Result<Amount, Self::Error> {
        (**self).sweep(to)
    }
}

impl SettlementInstruction {
    /// Stable name for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SettlementInstruction::Collect { .. } => "collect",
            SettlementInstruction::Refund { .. } => "refund",
            SettlementInstruction::Payout { .. } => "payout",
            SettlementInstruction::Sweep { .. } => "sweep",
        }
    }

    /// The principal value moves from or to.
    pub fn counterparty(&self) -> PrincipalId {
        match *self {
            SettlementInstruction::Collect { from, .. } => from,
            SettlementInstruction::Refund { to, .. }
            | SettlementInstruction::Payout { to, .. }
            | SettlementInstruction::Sweep { to } => to,
        }
    }

    /// Carry out this instruction. Returns the amount moved.
    pub fn execute<S>(&self, settlement: &S) -> Result<Amount, S::Error>
    where
        S: Settlement + ?Sized,
    {
        match *self {
            SettlementInstruction::Collect { from, amount } => {
                settlement.collect(from, amount).map(|()| amount)
            }
            SettlementInstruction::Refund { to, amount } => {
                settlement.refund(to, amount).map(|()| amount)
            }
            SettlementInstruction::Payout { to, amount } => {
                settlement.payout(to, amount).map(|()| amount)
            }
            SettlementInstruction::Sweep { to } => settlement.sweep(to),
        }
    }
}

impl LedgerEvent {
    /// Value that must be in custody before this event may commit.
    pub fn collection(&self) -> Option<SettlementInstruction> {
        match self {
            LedgerEvent::CourseEnrolled(e) => Some(SettlementInstruction::Collect {
                from: e.student,
                amount: e.attached_amount,
            }),
            _ => None,
        }
    }

    /// Transfers this event queues once committed, in execution order.
    pub fn settlement_instructions(&self) -> Vec<SettlementInstruction> {
        match self {
            LedgerEvent::CourseEnrolled(e) => {
                let refund = e.refund_due();
                if refund > 0 {
                    vec![SettlementInstruction::Refund {
                        to: e.student,
                        amount: refund,
                    }]
                } else {
                    Vec::new()
                }
            }
            LedgerEvent::EarningsWithdrawn(e) => vec![SettlementInstruction::Payout {
                to: e.instructor,
                amount: e.amount,
            }],
            LedgerEvent::EmergencySweepRequested(e) => {
                vec![SettlementInstruction::Sweep { to: e.owner }]
            }
            LedgerEvent::LedgerOpened(_)
            | LedgerEvent::CourseCreated(_)
            | LedgerEvent::StudentRegistered(_)
            | LedgerEvent::CourseCompleted(_)
            | LedgerEvent::CourseStatusToggled(_)
            | LedgerEvent::SettlementCompleted(_) => Vec::new(),
        }
    }
}

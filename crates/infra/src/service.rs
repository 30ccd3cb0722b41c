//! Ledger service: the single-writer execution pipeline.
//!
//! ```text
//! CallContext + operation
//!   ↓
//! 1. Reject value attached to a non-payable operation
//!   ↓
//! 2. Ledger::handle (every precondition checked, events decided, no mutation)
//!   ↓
//! 3. Collect attached value into custody
//!   ↓
//! 4. Journal append at the current version (commit point)
//!   ↓
//! 5. Ledger::apply (queues post-commit settlements)
//!   ↓
//! 6. Publish envelopes on the bus (best-effort)
//!   ↓  (write lock released)
//! 7. Execute queued settlements, journaling each completion
//! ```
//!
//! Steps 1-6 run under one exclusive write lock, so operations on a ledger
//! are serialized and a rejected operation never leaves partial state. A
//! failed collection aborts the operation; a failed append hands the
//! collected value back. A failed post-commit settlement is surfaced to the
//! caller and stays pending in the ledger until
//! `retry_pending_settlements` runs it.

use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use coursemart_core::{
    Aggregate, AggregateRoot, Amount, CourseId, ExpectedVersion, LedgerError, LedgerId,
    PrincipalId,
};
use coursemart_events::{EventBus, EventEnvelope};
use coursemart_marketplace::{
    CallContext, CompleteCourse, CompleteSettlement, Course, CreateCourse, DirectPayment,
    EmergencyWithdraw, EnrollInCourse, Enrollment, Ledger, LedgerCommand, LedgerEvent,
    LedgerSummary, OpenLedger, PendingSettlement, RegisterStudent, Settlement,
    SettlementInstruction, Student, ToggleCourseStatus, WithdrawEarnings,
};

use crate::journal::{JournalEntry, JournalError, JournalStore, UncommittedEntry};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A named precondition failed; nothing was written.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("journal: {0}")]
    Journal(#[from] JournalError),

    /// Moving value failed. A failed collection means nothing was
    /// committed; any other failure leaves the transfer pending.
    #[error("settlement failed: {0}")]
    Settlement(String),

    #[error("configured owner {configured} does not match persisted owner {persisted}")]
    OwnerMismatch {
        configured: PrincipalId,
        persisted: PrincipalId,
    },

    #[error("corrupt journal: {0}")]
    CorruptJournal(String),

    /// A committed operation did not produce the event it always produces.
    #[error("unexpected outcome of {0}")]
    UnexpectedOutcome(&'static str),

    #[error("ledger lock poisoned")]
    Poisoned,
}

impl ServiceError {
    /// The domain failure, if this is one.
    pub fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            ServiceError::Ledger(e) => Some(e),
            _ => None,
        }
    }
}

/// Outcome of an accepted enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnrollmentReceipt {
    pub course_id: CourseId,
    pub student: PrincipalId,
    /// Credited to the instructor.
    pub price: Amount,
    /// Returned to the student.
    pub refunded: Amount,
}

/// Outcome of `retry_pending_settlements`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SettlementRetry {
    pub settled: usize,
    pub failed: usize,
    /// Total moved by the settlements that ran.
    pub amount: Amount,
}

/// Events committed by one dispatch and the settlements they queued.
struct Committed {
    events: Vec<LedgerEvent>,
    settlements: Vec<u64>,
}

/// One ledger instance with its journal, bus and settlement collaborator.
#[derive(Debug)]
pub struct LedgerService<J, B, S> {
    ledger: RwLock<Ledger>,
    journal: J,
    bus: B,
    settlement: S,
    /// Held while pending settlements execute, so each runs once per attempt.
    settling: Mutex<()>,
}

impl<J, B, S> LedgerService<J, B, S>
where
    J: JournalStore,
    B: EventBus<EventEnvelope<JsonValue>>,
    S: Settlement,
{
    /// Rehydrate `ledger_id` from the journal, opening it for `owner` if the
    /// stream is empty.
    pub fn open(
        ledger_id: LedgerId,
        owner: PrincipalId,
        journal: J,
        bus: B,
        settlement: S,
    ) -> Result<Self, ServiceError> {
        let history = journal.load_stream(ledger_id)?;
        validate_loaded_stream(ledger_id, &history)?;

        let mut ledger = Ledger::empty(ledger_id);
        apply_history(&mut ledger, &history)?;

        if !history.is_empty() && !ledger.is_opened() {
            return Err(ServiceError::CorruptJournal(
                "stream does not start with a ledger opening".to_string(),
            ));
        }

        let service = Self {
            ledger: RwLock::new(ledger),
            journal,
            bus,
            settlement,
            settling: Mutex::new(()),
        };

        if history.is_empty() {
            service.dispatch(
                &CallContext::new(owner),
                LedgerCommand::OpenLedger(OpenLedger {
                    ledger_id,
                    owner,
                    occurred_at: Utc::now(),
                }),
            )?;
        } else if let Some(persisted) = service.read()?.owner() {
            if persisted != owner {
                return Err(ServiceError::OwnerMismatch {
                    configured: owner,
                    persisted,
                });
            }
        }

        let pending = service.read()?.store().pending_settlements().count();
        if pending > 0 {
            warn!(ledger_id = %ledger_id, pending, "ledger has settlements awaiting retry");
        }
        info!(
            ledger_id = %ledger_id,
            owner = %owner,
            replayed = history.len(),
            "ledger opened"
        );

        Ok(service)
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn journal(&self) -> &J {
        &self.journal
    }

    pub fn settlement(&self) -> &S {
        &self.settlement
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_course(
        &self,
        ctx: &CallContext,
        title: impl Into<String>,
        description: impl Into<String>,
        price: Amount,
    ) -> Result<CourseId, ServiceError> {
        let events = self.execute(
            ctx,
            LedgerCommand::CreateCourse(CreateCourse {
                caller: ctx.caller(),
                title: title.into(),
                description: description.into(),
                price,
                occurred_at: Utc::now(),
            }),
        )?;
        events
            .iter()
            .find_map(|e| match e {
                LedgerEvent::CourseCreated(c) => Some(c.course_id),
                _ => None,
            })
            .ok_or(ServiceError::UnexpectedOutcome("create_course"))
    }

    pub fn register_student(
        &self,
        ctx: &CallContext,
        name: impl Into<String>,
    ) -> Result<(), ServiceError> {
        self.execute(
            ctx,
            LedgerCommand::RegisterStudent(RegisterStudent {
                caller: ctx.caller(),
                name: name.into(),
                occurred_at: Utc::now(),
            }),
        )
        .map(|_| ())
    }

    /// Enroll the caller, paying with the value attached to `ctx`.
    pub fn enroll_in_course(
        &self,
        ctx: &CallContext,
        course_id: CourseId,
    ) -> Result<EnrollmentReceipt, ServiceError> {
        let events = self.execute(
            ctx,
            LedgerCommand::EnrollInCourse(EnrollInCourse {
                caller: ctx.caller(),
                course_id,
                attached_amount: ctx.attached_value(),
                occurred_at: Utc::now(),
            }),
        )?;
        events
            .iter()
            .find_map(|e| match e {
                LedgerEvent::CourseEnrolled(en) => Some(EnrollmentReceipt {
                    course_id: en.course_id,
                    student: en.student,
                    price: en.price,
                    refunded: en.refund_due(),
                }),
                _ => None,
            })
            .ok_or(ServiceError::UnexpectedOutcome("enroll_in_course"))
    }

    pub fn complete_course(
        &self,
        ctx: &CallContext,
        course_id: CourseId,
        rating: u8,
    ) -> Result<(), ServiceError> {
        self.execute(
            ctx,
            LedgerCommand::CompleteCourse(CompleteCourse {
                caller: ctx.caller(),
                course_id,
                rating,
                occurred_at: Utc::now(),
            }),
        )
        .map(|_| ())
    }

    /// Returns the course's status after the toggle.
    pub fn toggle_course_status(
        &self,
        ctx: &CallContext,
        course_id: CourseId,
    ) -> Result<bool, ServiceError> {
        let events = self.execute(
            ctx,
            LedgerCommand::ToggleCourseStatus(ToggleCourseStatus {
                caller: ctx.caller(),
                course_id,
                occurred_at: Utc::now(),
            }),
        )?;
        events
            .iter()
            .find_map(|e| match e {
                LedgerEvent::CourseStatusToggled(t) => Some(t.is_active),
                _ => None,
            })
            .ok_or(ServiceError::UnexpectedOutcome("toggle_course_status"))
    }

    /// Withdraw the caller's whole earnings balance. Returns the amount paid out.
    pub fn withdraw_earnings(&self, ctx: &CallContext) -> Result<Amount, ServiceError> {
        let events = self.execute(
            ctx,
            LedgerCommand::WithdrawEarnings(WithdrawEarnings {
                caller: ctx.caller(),
                occurred_at: Utc::now(),
            }),
        )?;
        events
            .iter()
            .find_map(|e| match e {
                LedgerEvent::EarningsWithdrawn(w) => Some(w.amount),
                _ => None,
            })
            .ok_or(ServiceError::UnexpectedOutcome("withdraw_earnings"))
    }

    /// Owner only. Returns the amount swept from custody.
    pub fn emergency_withdraw(&self, ctx: &CallContext) -> Result<Amount, ServiceError> {
        let committed = self.dispatch(
            ctx,
            LedgerCommand::EmergencyWithdraw(EmergencyWithdraw {
                caller: ctx.caller(),
                occurred_at: Utc::now(),
            }),
        )?;
        let swept = self.settle(&committed.settlements)?;
        Ok(swept.into_iter().sum())
    }

    /// Owner only. Run every pending settlement again, oldest first.
    ///
    /// A settlement that fails again stays pending and is counted in
    /// `failed`; the others still run.
    pub fn retry_pending_settlements(
        &self,
        ctx: &CallContext,
    ) -> Result<SettlementRetry, ServiceError> {
        if ctx.carries_value() {
            return Err(LedgerError::UnsupportedDirectPayment.into());
        }
        let _settling = self.settling.lock().map_err(|_| ServiceError::Poisoned)?;

        let pending: Vec<u64> = {
            let ledger = self.read()?;
            if ledger.owner() != Some(ctx.caller()) {
                return Err(LedgerError::NotOwner.into());
            }
            ledger.store().pending_settlements().map(|p| p.id).collect()
        };

        let mut report = SettlementRetry::default();
        for id in pending {
            match self.settle_one(id) {
                Ok(Some(amount)) => {
                    report.settled += 1;
                    report.amount = report.amount.saturating_add(amount);
                }
                Ok(None) => {}
                Err(ServiceError::Settlement(_)) => report.failed += 1,
                Err(e) => return Err(e),
            }
        }

        info!(
            settled = report.settled,
            failed = report.failed,
            amount = report.amount,
            "pending settlements retried"
        );
        Ok(report)
    }

    /// Value sent with no operation. Always rejected.
    pub fn direct_payment(&self, ctx: &CallContext) -> Result<(), ServiceError> {
        self.execute(
            ctx,
            LedgerCommand::DirectPayment(DirectPayment {
                caller: ctx.caller(),
                amount: ctx.attached_value(),
                occurred_at: Utc::now(),
            }),
        )
        .map(|_| ())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries (shared read lock)
    // ─────────────────────────────────────────────────────────────────────

    pub fn get_course(&self, course_id: CourseId) -> Result<Course, ServiceError> {
        Ok(self.read()?.get_course(course_id)?.clone())
    }

    pub fn get_student_courses(&self, student: PrincipalId) -> Result<Vec<CourseId>, ServiceError> {
        Ok(self.read()?.get_student_courses(student)?.to_vec())
    }

    pub fn get_student(&self, student: PrincipalId) -> Result<Student, ServiceError> {
        Ok(self.read()?.get_student(student)?.clone())
    }

    pub fn get_enrollment(
        &self,
        course_id: CourseId,
        student: PrincipalId,
    ) -> Result<Enrollment, ServiceError> {
        Ok(self.read()?.get_enrollment(course_id, student)?.clone())
    }

    pub fn earnings_of(&self, principal: PrincipalId) -> Result<Amount, ServiceError> {
        Ok(self.read()?.earnings_of(principal))
    }

    pub fn is_registered(&self, principal: PrincipalId) -> Result<bool, ServiceError> {
        Ok(self.read()?.is_registered(principal))
    }

    pub fn pending_settlements(&self) -> Result<Vec<PendingSettlement>, ServiceError> {
        Ok(self.read()?.pending_settlements())
    }

    pub fn summary(&self) -> Result<LedgerSummary, ServiceError> {
        Ok(self.read()?.summary())
    }

    /// Snapshot of the whole aggregate (tests, diagnostics).
    pub fn snapshot(&self) -> Result<Ledger, ServiceError> {
        Ok(self.read()?.clone())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Pipeline
    // ─────────────────────────────────────────────────────────────────────

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>, ServiceError> {
        self.ledger.read().map_err(|_| ServiceError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>, ServiceError> {
        self.ledger.write().map_err(|_| ServiceError::Poisoned)
    }

    /// Dispatch, then run the settlements the commit queued.
    fn execute(
        &self,
        ctx: &CallContext,
        command: LedgerCommand,
    ) -> Result<Vec<LedgerEvent>, ServiceError> {
        let committed = self.dispatch(ctx, command)?;
        self.settle(&committed.settlements)?;
        Ok(committed.events)
    }

    /// Decide, collect, journal, apply and publish under the write lock.
    fn dispatch(&self, ctx: &CallContext, command: LedgerCommand) -> Result<Committed, ServiceError> {
        let operation = command.name();
        let mut ledger = self.write()?;
        let ledger_id = ledger.id_typed();

        if ctx.carries_value() && !command.is_payable() {
            debug!(
                ledger_id = %ledger_id,
                operation,
                caller = %ctx.caller(),
                attached = ctx.attached_value(),
                "rejected value on non-payable operation"
            );
            return Err(LedgerError::UnsupportedDirectPayment.into());
        }

        let decided = ledger.handle(&command).inspect_err(|e| {
            debug!(
                ledger_id = %ledger_id,
                operation,
                caller = %ctx.caller(),
                code = e.code(),
                "operation rejected"
            );
        })?;
        if decided.is_empty() {
            return Ok(Committed {
                events: decided,
                settlements: Vec::new(),
            });
        }

        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEntry::from_typed(ledger_id, Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;

        let collected = self.collect_attached(ledger_id, operation, &decided)?;

        let committed = match self
            .journal
            .append(uncommitted, ExpectedVersion::Exact(ledger.version()))
        {
            Ok(committed) => committed,
            Err(e) => {
                self.return_collected(ledger_id, &collected);
                return Err(e.into());
            }
        };

        let first_settlement = ledger.store().next_settlement_id();
        for ev in &decided {
            ledger.apply(ev);
        }
        let settlements = (first_settlement..ledger.store().next_settlement_id()).collect();

        for entry in &committed {
            info!(
                ledger_id = %ledger_id,
                operation,
                event_type = %entry.event_type,
                sequence_number = entry.sequence_number,
                "operation committed"
            );
            if let Err(e) = self.bus.publish(entry.to_envelope()) {
                warn!(
                    ledger_id = %ledger_id,
                    sequence_number = entry.sequence_number,
                    error = ?e,
                    "event publication failed; journal remains authoritative"
                );
            }
        }

        Ok(Committed {
            events: decided,
            settlements,
        })
    }

    /// Take the value attached to the decided events into custody. On a
    /// failure, whatever was already collected is handed back.
    fn collect_attached(
        &self,
        ledger_id: LedgerId,
        operation: &'static str,
        events: &[LedgerEvent],
    ) -> Result<Vec<SettlementInstruction>, ServiceError> {
        let mut collected = Vec::new();
        for instruction in events.iter().filter_map(LedgerEvent::collection) {
            if let Err(e) = instruction.execute(&self.settlement) {
                warn!(
                    ledger_id = %ledger_id,
                    operation,
                    instruction = ?instruction,
                    error = %e,
                    "collection failed; operation not committed"
                );
                self.return_collected(ledger_id, &collected);
                return Err(ServiceError::Settlement(describe(&instruction, &e)));
            }
            collected.push(instruction);
        }
        Ok(collected)
    }

    fn return_collected(&self, ledger_id: LedgerId, collected: &[SettlementInstruction]) {
        for instruction in collected {
            let SettlementInstruction::Collect { from, amount } = *instruction else {
                continue;
            };
            if let Err(e) = self.settlement.refund(from, amount) {
                error!(
                    ledger_id = %ledger_id,
                    from = %from,
                    amount,
                    error = %e,
                    "collected value could not be returned after a failed commit"
                );
            }
        }
    }

    /// Run the given pending settlements in order. Stops at the first
    /// failure; the rest stay pending.
    fn settle(&self, ids: &[u64]) -> Result<Vec<Amount>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let _settling = self.settling.lock().map_err(|_| ServiceError::Poisoned)?;

        let mut moved = Vec::new();
        for &id in ids {
            if let Some(amount) = self.settle_one(id)? {
                moved.push(amount);
            }
        }
        Ok(moved)
    }

    /// Execute one pending settlement and journal its completion. Returns
    /// `None` if it was already completed. Caller holds `settling`.
    fn settle_one(&self, id: u64) -> Result<Option<Amount>, ServiceError> {
        let Some(pending) = self.read()?.store().pending_settlement(id).copied() else {
            debug!(settlement_id = id, "settlement already completed");
            return Ok(None);
        };
        let instruction = pending.instruction;

        let amount = instruction.execute(&self.settlement).map_err(|e| {
            warn!(
                settlement_id = id,
                instruction = ?instruction,
                error = %e,
                "settlement failed; left pending"
            );
            ServiceError::Settlement(describe(&instruction, &e))
        })?;

        self.dispatch(
            &CallContext::new(instruction.counterparty()),
            LedgerCommand::CompleteSettlement(CompleteSettlement {
                settlement_id: id,
                amount,
                occurred_at: Utc::now(),
            }),
        )
        .inspect_err(|e| {
            error!(
                settlement_id = id,
                instruction = ?instruction,
                error = %e,
                "settlement ran but its completion was not journaled; a retry will run it again"
            );
        })?;

        debug!(settlement_id = id, kind = instruction.kind(), amount, "settled");
        Ok(Some(amount))
    }
}

fn describe(instruction: &SettlementInstruction, error: &dyn std::error::Error) -> String {
    format!("{}: {error}", instruction.kind())
}

fn validate_loaded_stream(ledger_id: LedgerId, stream: &[JournalEntry]) -> Result<(), ServiceError> {
    for (idx, e) in stream.iter().enumerate() {
        if e.ledger_id != ledger_id {
            return Err(ServiceError::CorruptJournal(format!(
                "loaded stream contains wrong ledger_id at index {idx}"
            )));
        }
        let expected = idx as u64 + 1;
        if e.sequence_number != expected {
            return Err(ServiceError::CorruptJournal(format!(
                "sequence gap at index {idx} (expected {expected}, found {})",
                e.sequence_number
            )));
        }
    }
    Ok(())
}

fn apply_history(ledger: &mut Ledger, history: &[JournalEntry]) -> Result<(), ServiceError> {
    for entry in history {
        let ev: LedgerEvent = serde_json::from_value(entry.payload.clone()).map_err(|e| {
            ServiceError::CorruptJournal(format!(
                "entry {} ({}): {e}",
                entry.sequence_number, entry.event_type
            ))
        })?;
        ledger.apply(&ev);
    }
    Ok(())
}

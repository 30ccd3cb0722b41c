//! Course marketplace ledger (event-sourced state machine).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! `Ledger` aggregate validates commands against the `LedgerStore` and decides
//! events; applying those events is the only way the store changes.

pub mod command;
pub mod context;
pub mod event;
pub mod ledger;
pub mod model;
pub mod settlement;
pub mod store;

pub use command::{
    CompleteCourse, CompleteSettlement, CreateCourse, DirectPayment, EmergencyWithdraw,
    EnrollInCourse, LedgerCommand, OpenLedger, RegisterStudent, ToggleCourseStatus,
    WithdrawEarnings,
};
pub use context::CallContext;
pub use event::{
    CourseCompleted, CourseCreated, CourseEnrolled, CourseStatusToggled, EarningsWithdrawn,
    EmergencySweepRequested, LedgerEvent, LedgerOpened, SettlementCompleted, StudentRegistered,
};
pub use ledger::{Ledger, LedgerSummary};
pub use model::{Course, Enrollment, EnrollmentKey, Student};
pub use settlement::{PendingSettlement, Settlement, SettlementInstruction};
pub use store::LedgerStore;

//! `coursemart-infra` — persistence, execution pipeline and runtime wiring
//! for the marketplace ledger.

pub mod config;
pub mod custody;
pub mod journal;
pub mod service;

pub use config::{ConfigError, LedgerConfig};
pub use custody::{CustodyError, InMemoryCustody};
pub use journal::{
    FileJournal, InMemoryJournal, JournalEntry, JournalError, JournalStore, UncommittedEntry,
};
pub use service::{EnrollmentReceipt, LedgerService, ServiceError, SettlementRetry};

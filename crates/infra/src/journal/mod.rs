//! Append-only ledger journal.
//!
//! The journal is the ledger's only persisted state and its audit log: a
//! mutation is committed exactly when its events are appended here.

pub mod file;
pub mod in_memory;
pub mod r#trait;

pub use file::FileJournal;
pub use in_memory::InMemoryJournal;
pub use r#trait::{JournalEntry, JournalError, JournalStore, UncommittedEntry};

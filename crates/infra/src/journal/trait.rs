use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use coursemart_core::{ExpectedVersion, LedgerId};
use coursemart_events::EventEnvelope;
use std::sync::Arc;

/// An event ready to be appended (not yet assigned a sequence number).
///
/// Built from a typed domain event with `UncommittedEntry::from_typed`, which
/// serializes the payload and captures the metadata needed to replay it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedEntry {
    pub entry_id: Uuid,
    pub ledger_id: LedgerId,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

/// A committed journal entry.
///
/// Sequence numbers start at 1, are gap-free and never reused within a
/// ledger's stream. The sequence number of the last entry is the ledger's
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: Uuid,
    pub ledger_id: LedgerId,

    /// Monotonically increasing position in the ledger stream.
    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl JournalEntry {
    /// Convert a committed entry into an envelope for publication.
    pub fn to_envelope(&self) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            self.entry_id,
            self.ledger_id,
            self.sequence_number,
            self.event_type.clone(),
            self.occurred_at,
            self.payload.clone(),
        )
    }
}

/// Journal operation error (infrastructure, not domain).
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("journal io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal serialization failed: {0}")]
    Serialization(String),

    #[error("journal lock poisoned")]
    Poisoned,
}

/// Append-only store of ledger streams (one stream per `LedgerId`).
///
/// Implementations must:
/// - append a batch atomically (all entries or none)
/// - reject a batch whose entries target more than one ledger
/// - enforce `expected_version` against the current stream version
/// - assign sequence numbers starting at `current_version + 1`
pub trait JournalStore: Send + Sync {
    fn append(
        &self,
        entries: Vec<UncommittedEntry>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<JournalEntry>, JournalError>;

    /// Load the full stream for a ledger (empty if it does not exist yet).
    fn load_stream(&self, ledger_id: LedgerId) -> Result<Vec<JournalEntry>, JournalError>;
}

impl<S> JournalStore for Arc<S>
where
    S: JournalStore + ?Sized,
{
    fn append(
        &self,
        entries: Vec<UncommittedEntry>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<JournalEntry>, JournalError> {
        (**self).append(entries, expected_version)
    }

    fn load_stream(&self, ledger_id: LedgerId) -> Result<Vec<JournalEntry>, JournalError> {
        (**self).load_stream(ledger_id)
    }
}

impl UncommittedEntry {
    /// Build an entry from a typed domain event.
    pub fn from_typed<E>(ledger_id: LedgerId, entry_id: Uuid, event: &E) -> Result<Self, JournalError>
    where
        E: coursemart_events::Event + Serialize,
    {
        let payload = serde_json::to_value(event)
            .map_err(|e| JournalError::Serialization(format!("payload serialization failed: {e}")))?;

        Ok(Self {
            entry_id,
            ledger_id,
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
        })
    }

    /// Assign a sequence number, committing the entry.
    pub fn commit(self, sequence_number: u64) -> JournalEntry {
        JournalEntry {
            entry_id: self.entry_id,
            ledger_id: self.ledger_id,
            sequence_number,
            event_type: self.event_type,
            event_version: self.event_version,
            occurred_at: self.occurred_at,
            payload: self.payload,
        }
    }
}

/// The single ledger a batch targets (`None` for an empty batch).
pub(crate) fn batch_ledger(entries: &[UncommittedEntry]) -> Result<Option<LedgerId>, JournalError> {
    let Some(first) = entries.first() else {
        return Ok(None);
    };
    for (idx, e) in entries.iter().enumerate() {
        if e.ledger_id != first.ledger_id {
            return Err(JournalError::InvalidAppend(format!(
                "batch contains multiple ledger_ids (index {idx})"
            )));
        }
    }
    Ok(Some(first.ledger_id))
}

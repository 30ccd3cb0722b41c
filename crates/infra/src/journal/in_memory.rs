use std::collections::HashMap;
use std::sync::RwLock;

use coursemart_core::{ExpectedVersion, LedgerId};

use super::r#trait::{JournalEntry, JournalError, JournalStore, UncommittedEntry, batch_ledger};

/// In-memory append-only journal.
///
/// Intended for tests/dev. Contents are lost with the process.
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    streams: RwLock<HashMap<LedgerId, Vec<JournalEntry>>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[JournalEntry]) -> u64 {
        stream.last().map(|e| e.sequence_number).unwrap_or(0)
    }
}

impl JournalStore for InMemoryJournal {
    fn append(
        &self,
        entries: Vec<UncommittedEntry>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<JournalEntry>, JournalError> {
        let Some(ledger_id) = batch_ledger(&entries)? else {
            return Ok(vec![]);
        };

        let mut streams = self.streams.write().map_err(|_| JournalError::Poisoned)?;

        let stream = streams.entry(ledger_id).or_default();
        let current = Self::current_version(stream);

        if !expected_version.matches(current) {
            return Err(JournalError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        let committed: Vec<JournalEntry> = entries
            .into_iter()
            .zip(current + 1..)
            .map(|(e, seq)| e.commit(seq))
            .collect();
        stream.extend(committed.iter().cloned());

        Ok(committed)
    }

    fn load_stream(&self, ledger_id: LedgerId) -> Result<Vec<JournalEntry>, JournalError> {
        let streams = self.streams.read().map_err(|_| JournalError::Poisoned)?;
        Ok(streams.get(&ledger_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(ledger_id: LedgerId) -> UncommittedEntry {
        UncommittedEntry {
            entry_id: Uuid::now_v7(),
            ledger_id,
            event_type: "marketplace.test".to_string(),
            event_version: 1,
            occurred_at: Utc::now(),
            payload: serde_json::json!({ "n": 1 }),
        }
    }

    #[test]
    fn append_assigns_gap_free_sequence_numbers() {
        let journal = InMemoryJournal::new();
        let ledger_id = LedgerId::new();

        let first = journal
            .append(vec![entry(ledger_id), entry(ledger_id)], ExpectedVersion::Exact(0))
            .unwrap();
        let second = journal
            .append(vec![entry(ledger_id)], ExpectedVersion::Exact(2))
            .unwrap();

        assert_eq!(first.iter().map(|e| e.sequence_number).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(second[0].sequence_number, 3);
        assert_eq!(journal.load_stream(ledger_id).unwrap().len(), 3);
    }

    #[test]
    fn stale_expected_version_is_rejected() {
        let journal = InMemoryJournal::new();
        let ledger_id = LedgerId::new();
        journal
            .append(vec![entry(ledger_id)], ExpectedVersion::Exact(0))
            .unwrap();

        let err = journal
            .append(vec![entry(ledger_id)], ExpectedVersion::Exact(0))
            .unwrap_err();
        assert!(matches!(err, JournalError::Concurrency(_)));
        assert_eq!(journal.load_stream(ledger_id).unwrap().len(), 1);
    }

    #[test]
    fn mixed_ledger_batches_are_rejected() {
        let journal = InMemoryJournal::new();
        let err = journal
            .append(
                vec![entry(LedgerId::new()), entry(LedgerId::new())],
                ExpectedVersion::Any,
            )
            .unwrap_err();
        assert!(matches!(err, JournalError::InvalidAppend(_)));
    }

    #[test]
    fn streams_are_isolated_per_ledger() {
        let journal = InMemoryJournal::new();
        let a = LedgerId::new();
        let b = LedgerId::new();
        journal.append(vec![entry(a)], ExpectedVersion::Exact(0)).unwrap();

        assert!(journal.load_stream(b).unwrap().is_empty());
        let committed = journal.append(vec![entry(b)], ExpectedVersion::Exact(0)).unwrap();
        assert_eq!(committed[0].sequence_number, 1);
    }
}

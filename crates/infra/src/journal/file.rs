use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use coursemart_core::{ExpectedVersion, LedgerId};

use super::r#trait::{JournalEntry, JournalError, JournalStore, UncommittedEntry, batch_ledger};

/// Durable journal: one JSON-lines file per ledger under `dir`.
///
/// Appends are written in a single `write_all`, flushed and `sync_data`'d
/// before returning, so a returned entry survives a process restart.
#[derive(Debug)]
pub struct FileJournal {
    dir: PathBuf,
    /// Cached stream versions; also serializes appends.
    versions: Mutex<HashMap<LedgerId, u64>>,
}

impl FileJournal {
    /// Open (creating if needed) a journal directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            versions: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn stream_path(&self, ledger_id: LedgerId) -> PathBuf {
        self.dir.join(format!("{ledger_id}.jsonl"))
    }

    /// Read a stream, repairing a torn final line.
    ///
    /// A line that fails to parse is a torn append only if nothing valid
    /// follows it; the file is truncated back to the start of that line.
    /// Corruption anywhere else is reported with its line number.
    fn recover(path: &Path) -> Result<Vec<JournalEntry>, JournalError> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        let mut offset = 0usize;
        for (idx, raw) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
            let line_start = offset;
            offset += raw.len();
            if raw.trim_ascii().is_empty() {
                continue;
            }
            match serde_json::from_slice::<JournalEntry>(raw) {
                Ok(entry) => {
                    if !raw.ends_with(b"\n") {
                        OpenOptions::new().append(true).open(path)?.write_all(b"\n")?;
                    }
                    entries.push(entry);
                }
                Err(e) if bytes[offset..].trim_ascii().is_empty() => {
                    warn!(
                        path = %path.display(),
                        line = idx + 1,
                        offset = line_start,
                        error = %e,
                        "torn journal tail; truncating"
                    );
                    let file = OpenOptions::new().write(true).open(path)?;
                    file.set_len(line_start as u64)?;
                    file.sync_data()?;
                    break;
                }
                Err(e) => {
                    return Err(JournalError::Serialization(format!(
                        "{}:{}: {e}",
                        path.display(),
                        idx + 1
                    )));
                }
            }
        }
        Ok(entries)
    }

    /// Append `buf` durably. On failure the file is cut back to its previous
    /// length so a partial batch is never left behind.
    fn write_batch(path: &Path, buf: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let previous_len = file.metadata()?.len();

        let written = file
            .write_all(buf)
            .and_then(|()| file.flush())
            .and_then(|()| file.sync_data());
        if let Err(e) = written {
            if let Err(rollback) = file.set_len(previous_len) {
                warn!(
                    path = %path.display(),
                    error = %rollback,
                    "could not roll back failed journal append"
                );
            }
            return Err(e);
        }
        Ok(())
    }
}

impl JournalStore for FileJournal {
    fn append(
        &self,
        entries: Vec<UncommittedEntry>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<JournalEntry>, JournalError> {
        let Some(ledger_id) = batch_ledger(&entries)? else {
            return Ok(vec![]);
        };

        let mut versions = self.versions.lock().map_err(|_| JournalError::Poisoned)?;
        let path = self.stream_path(ledger_id);

        let current = match versions.get(&ledger_id) {
            Some(v) => *v,
            None => Self::recover(&path)?
                .last()
                .map(|e| e.sequence_number)
                .unwrap_or(0),
        };

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

        let mut buf = String::new();
        for entry in &committed {
            let line = serde_json::to_string(entry)
                .map_err(|e| JournalError::Serialization(e.to_string()))?;
            buf.push_str(&line);
            buf.push('\n');
        }

        if let Err(e) = Self::write_batch(&path, buf.as_bytes()) {
            // Re-read the stream on the next append instead of trusting the cache.
            versions.remove(&ledger_id);
            return Err(e.into());
        }

        let last = committed.last().map(|e| e.sequence_number).unwrap_or(current);
        versions.insert(ledger_id, last);

        debug!(
            ledger_id = %ledger_id,
            path = %path.display(),
            entries = committed.len(),
            version = last,
            "journal append synced"
        );

        Ok(committed)
    }

    fn load_stream(&self, ledger_id: LedgerId) -> Result<Vec<JournalEntry>, JournalError> {
        // Hold the append lock so a load never sees a half-written batch.
        let _guard = self.versions.lock().map_err(|_| JournalError::Poisoned)?;
        Self::recover(&self.stream_path(ledger_id))
    }
}

//! Runtime configuration, read from `COURSEMART_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use coursemart_core::{LedgerId, PrincipalId};

use crate::journal::{FileJournal, InMemoryJournal, JournalError, JournalStore};

pub const OWNER_VAR: &str = "COURSEMART_OWNER";
pub const LEDGER_ID_VAR: &str = "COURSEMART_LEDGER_ID";
pub const JOURNAL_DIR_VAR: &str = "COURSEMART_JOURNAL_DIR";
pub const BIND_ADDR_VAR: &str = "COURSEMART_BIND_ADDR";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub owner: PrincipalId,
    pub ledger_id: LedgerId,
    /// `None` keeps the journal in memory.
    pub journal_dir: Option<PathBuf>,
    pub bind_addr: SocketAddr,
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let owner = get(OWNER_VAR)
            .ok_or(ConfigError::Missing(OWNER_VAR))?
            .trim()
            .parse::<PrincipalId>()
            .map_err(|e| invalid(OWNER_VAR, e))?;

        let ledger_id = match get(LEDGER_ID_VAR) {
            Some(raw) => raw.trim().parse::<LedgerId>().map_err(|e| invalid(LEDGER_ID_VAR, e))?,
            None => LedgerId::default_ledger(),
        };

        let journal_dir = get(JOURNAL_DIR_VAR).map(PathBuf::from);
        if journal_dir.is_none() {
            tracing::warn!("{JOURNAL_DIR_VAR} not set; ledger journal is in-memory only");
        }

        let bind_addr = get(BIND_ADDR_VAR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| invalid(BIND_ADDR_VAR, e))?;

        Ok(Self {
            owner,
            ledger_id,
            journal_dir,
            bind_addr,
        })
    }

    /// Build the configured journal backend.
    pub fn open_journal(&self) -> Result<Arc<dyn JournalStore>, JournalError> {
        Ok(match &self.journal_dir {
            Some(dir) => Arc::new(FileJournal::open(dir)?),
            None => Arc::new(InMemoryJournal::new()),
        })
    }
}

fn invalid(var: &'static str, e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_owner_is_set() {
        let owner = PrincipalId::new();
        let config = LedgerConfig::from_lookup(lookup(&[(OWNER_VAR, &owner.to_string())])).unwrap();

        assert_eq!(config.owner, owner);
        assert_eq!(config.ledger_id, LedgerId::default_ledger());
        assert_eq!(config.journal_dir, None);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn owner_is_required() {
        let err = LedgerConfig::from_lookup(lookup(&[(OWNER_VAR, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(OWNER_VAR));
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let owner = PrincipalId::new().to_string();
        let err = LedgerConfig::from_lookup(lookup(&[
            (OWNER_VAR, &owner),
            (BIND_ADDR_VAR, "not-an-addr"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: BIND_ADDR_VAR, .. }));

        let err = LedgerConfig::from_lookup(lookup(&[(OWNER_VAR, "nope")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: OWNER_VAR, .. }));
    }

    #[test]
    fn journal_dir_selects_file_journal() {
        let dir = tempfile::tempdir().unwrap();
        let owner = PrincipalId::new().to_string();
        let ledger = LedgerId::new();
        let config = LedgerConfig::from_lookup(lookup(&[
            (OWNER_VAR, &owner),
            (LEDGER_ID_VAR, &ledger.to_string()),
            (JOURNAL_DIR_VAR, dir.path().to_str().unwrap()),
        ]))
        .unwrap();

        assert_eq!(config.ledger_id, ledger);
        assert_eq!(config.journal_dir.as_deref(), Some(dir.path()));
        let journal = config.open_journal().unwrap();
        assert!(journal.load_stream(ledger).unwrap().is_empty());
    }
}

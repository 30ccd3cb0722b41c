//! Tracing/logging initialization.
//!
//! Every ledger event is logged as one JSON object per line so the audit trail
//! (operation, ledger id, event type, sequence number) is machine-readable.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize tracing with `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_default_filter(DEFAULT_FILTER);
}

/// Like [`init`], with a caller-chosen fallback directive
/// (e.g. `"coursemart_infra=debug,info"`).
pub fn init_with_default_filter(default: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_current_span(true)
        .try_init();
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_no_op() {
        init();
        init_with_default_filter("debug");
        ::tracing::info!(ledger_id = "test", "still logging after double init");
    }
}

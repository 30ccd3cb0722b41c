//! Process-wide tracing setup shared by the marketplace binaries.

/// Tracing configuration (filters, formatter).
pub mod tracing;

pub use self::tracing::{DEFAULT_FILTER, init, init_with_default_filter};

//! `coursemart-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, amounts, the typed ledger error, and the aggregate traits the
//! marketplace state machine is built on.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{LedgerError, LedgerResult};
pub use id::{CourseId, LedgerId, PrincipalId};
pub use value_object::{Amount, Rating, ValueObject};

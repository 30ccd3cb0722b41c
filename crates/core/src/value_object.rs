//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value. To "modify" one,
/// construct a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Monetary amount in an indivisible base unit.
pub type Amount = u64;

/// A course rating in `1..=5`.
///
/// Constructing one is the only way to get a rating into an enrollment, so an
/// out-of-range value cannot reach the ledger.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, LedgerError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidRating(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl ValueObject for Rating {}

impl TryFrom<u8> for Rating {
    type Error = LedgerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

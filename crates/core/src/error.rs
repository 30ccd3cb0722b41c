//! Ledger error model.

use thiserror::Error;

use crate::id::CourseId;

/// Result type used across the domain layer.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Typed, named precondition failures.
///
/// Every state machine operation checks all of its preconditions before it
/// decides any event, so receiving one of these means nothing was written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A required text field was empty (or whitespace only).
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("price must be greater than zero")]
    InvalidPrice,

    #[error("principal is already registered")]
    AlreadyRegistered,

    #[error("principal is not a registered student")]
    NotRegistered,

    #[error("course {0} not found")]
    CourseNotFound(CourseId),

    #[error("course {0} is not active")]
    CourseInactive(CourseId),

    #[error("insufficient payment: price is {price}, attached {attached}")]
    InsufficientPayment { price: u64, attached: u64 },

    #[error("already enrolled in course {0}")]
    AlreadyEnrolled(CourseId),

    #[error("not enrolled in course {0}")]
    NotEnrolled(CourseId),

    #[error("course {0} is already completed")]
    AlreadyCompleted(CourseId),

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("no earnings to withdraw")]
    NoEarnings,

    #[error("caller is not the instructor of course {0}")]
    NotInstructor(CourseId),

    #[error("caller is not the ledger owner")]
    NotOwner,

    /// Value was attached to a call that does not accept payment.
    #[error("direct payments are not supported")]
    UnsupportedDirectPayment,

    /// A query key did not resolve.
    #[error("not found")]
    NotFound,

    /// Crediting earnings would overflow the balance type.
    #[error("amount overflow")]
    AmountOverflow,

    /// The settlement is unknown or has already been recorded as complete.
    #[error("settlement {0} is not pending")]
    SettlementNotPending(u64),

    #[error("ledger has not been opened")]
    LedgerNotOpened,

    #[error("ledger is already opened")]
    LedgerAlreadyOpened,
}

impl LedgerError {
    /// Stable machine-readable code (used in API error bodies and logs).
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::EmptyField(_) => "empty_field",
            LedgerError::InvalidPrice => "invalid_price",
            LedgerError::AlreadyRegistered => "already_registered",
            LedgerError::NotRegistered => "not_registered",
            LedgerError::CourseNotFound(_) => "course_not_found",
            LedgerError::CourseInactive(_) => "course_inactive",
            LedgerError::InsufficientPayment { .. } => "insufficient_payment",
            LedgerError::AlreadyEnrolled(_) => "already_enrolled",
            LedgerError::NotEnrolled(_) => "not_enrolled",
            LedgerError::AlreadyCompleted(_) => "already_completed",
            LedgerError::InvalidRating(_) => "invalid_rating",
            LedgerError::NoEarnings => "no_earnings",
            LedgerError::NotInstructor(_) => "not_instructor",
            LedgerError::NotOwner => "not_owner",
            LedgerError::UnsupportedDirectPayment => "unsupported_direct_payment",
            LedgerError::NotFound => "not_found",
            LedgerError::AmountOverflow => "amount_overflow",
            LedgerError::SettlementNotPending(_) => "settlement_not_pending",
            LedgerError::LedgerNotOpened => "ledger_not_opened",
            LedgerError::LedgerAlreadyOpened => "ledger_already_opened",
        }
    }
}

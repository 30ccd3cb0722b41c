use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use coursemart_core::LedgerError;
use coursemart_infra::{JournalError, ServiceError};

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Ledger(e) => ledger_error_to_response(&e),
        ServiceError::Journal(JournalError::Concurrency(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        ServiceError::Journal(e) => {
            tracing::error!(error = %e, "journal failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "journal_error", e.to_string())
        }
        ServiceError::Settlement(msg) => {
            json_error(StatusCode::BAD_GATEWAY, "settlement_failed", msg)
        }
        e @ (ServiceError::OwnerMismatch { .. }
        | ServiceError::CorruptJournal(_)
        | ServiceError::UnexpectedOutcome(_)
        | ServiceError::Poisoned) => {
            tracing::error!(error = %e, "ledger service failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", e.to_string())
        }
    }
}

pub fn ledger_error_to_response(err: &LedgerError) -> axum::response::Response {
    json_error(ledger_status(err), err.code(), err.to_string())
}

pub fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::EmptyField(_)
        | LedgerError::InvalidPrice
        | LedgerError::InvalidRating(_)
        | LedgerError::UnsupportedDirectPayment => StatusCode::BAD_REQUEST,
        LedgerError::InsufficientPayment { .. } => StatusCode::PAYMENT_REQUIRED,
        LedgerError::NotInstructor(_) | LedgerError::NotOwner => StatusCode::FORBIDDEN,
        LedgerError::CourseNotFound(_) | LedgerError::NotFound | LedgerError::NotRegistered => {
            StatusCode::NOT_FOUND
        }
        LedgerError::AlreadyRegistered
        | LedgerError::CourseInactive(_)
        | LedgerError::AlreadyEnrolled(_)
        | LedgerError::NotEnrolled(_)
        | LedgerError::AlreadyCompleted(_)
        | LedgerError::NoEarnings
        | LedgerError::AmountOverflow
        | LedgerError::SettlementNotPending(_)
        | LedgerError::LedgerNotOpened
        | LedgerError::LedgerAlreadyOpened => StatusCode::CONFLICT,
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursemart_core::CourseId;

    #[test]
    fn precondition_failures_map_to_documented_statuses() {
        assert_eq!(ledger_status(&LedgerError::InvalidRating(9)), StatusCode::BAD_REQUEST);
        assert_eq!(
            ledger_status(&LedgerError::InsufficientPayment { price: 2, attached: 1 }),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ledger_status(&LedgerError::NotInstructor(CourseId::new(1))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ledger_status(&LedgerError::CourseNotFound(CourseId::new(1))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ledger_status(&LedgerError::AlreadyEnrolled(CourseId::new(1))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn settlement_failure_is_a_bad_gateway() {
        let res = service_error_to_response(ServiceError::Settlement("payout: down".into()));
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }
}

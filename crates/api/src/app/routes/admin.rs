use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    response::IntoResponse,
    routing::{get, post},
};

use coursemart_marketplace::CallContext;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn public_router() -> Router {
    Router::new().route("/settlements/pending", get(pending_settlements))
}

pub fn router() -> Router {
    Router::new()
        .route("/admin/emergency-withdraw", post(emergency_withdraw))
        .route("/admin/settlements/retry", post(retry_settlements))
}

/// Owner only: sweep everything held in custody to the owner.
pub async fn emergency_withdraw(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallContext>,
) -> axum::response::Response {
    match services.ledger.emergency_withdraw(&ctx) {
        Ok(amount) => {
            tracing::warn!(caller = %ctx.caller(), amount, "emergency withdraw executed");
            Json(dto::AmountResponse { amount }).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn pending_settlements(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.pending_settlements() {
        Ok(pending) => Json(dto::PendingSettlementsResponse { pending }).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Owner only: run every pending settlement again.
pub async fn retry_settlements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallContext>,
) -> axum::response::Response {
    match services.ledger.retry_pending_settlements(&ctx) {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

use std::sync::Arc;

use axum::{Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::post};

use coursemart_marketplace::CallContext;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/payments", post(direct_payment))
}

/// Value sent without selecting an operation. The ledger refuses it.
pub async fn direct_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallContext>,
) -> axum::response::Response {
    match services.ledger.direct_payment(&ctx) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

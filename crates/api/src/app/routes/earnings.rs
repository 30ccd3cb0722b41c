use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
};

use coursemart_marketplace::CallContext;

use crate::app::routes::common::parse_principal;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn public_router() -> Router {
    Router::new().route("/earnings/:principal", get(earnings_of))
}

pub fn protected_router() -> Router {
    Router::new().route("/earnings/withdraw", post(withdraw))
}

pub async fn earnings_of(
    Extension(services): Extension<Arc<AppServices>>,
    Path(principal): Path<String>,
) -> axum::response::Response {
    let principal = match parse_principal(&principal) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.earnings_of(principal) {
        Ok(earnings) => Json(dto::EarningsResponse {
            principal,
            earnings,
        })
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn withdraw(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallContext>,
) -> axum::response::Response {
    match services.ledger.withdraw_earnings(&ctx) {
        Ok(amount) => Json(dto::AmountResponse { amount }).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

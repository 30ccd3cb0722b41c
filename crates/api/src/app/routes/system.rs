use std::sync::Arc;

use axum::{Json, Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::get};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/summary", get(summary))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn summary(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ledger.summary() {
        Ok(s) => Json(s).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

use axum::{http::StatusCode, middleware::Next, response::Response};

use crate::app::errors;
use crate::context::{self, IdentityError};

/// Resolve the `CallContext` from headers and attach it to the request.
pub async fn identity_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let ctx = context::call_context(req.headers()).map_err(|e| match e {
        IdentityError::MissingPrincipal => errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            format!("missing {} header", context::PRINCIPAL_HEADER),
        ),
        IdentityError::InvalidPrincipal => errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            format!("{} must be a UUID", context::PRINCIPAL_HEADER),
        ),
        IdentityError::InvalidAttachedValue => errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_attached_value",
            format!(
                "{} must be a non-negative integer",
                context::ATTACHED_VALUE_HEADER
            ),
        ),
    })?;

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

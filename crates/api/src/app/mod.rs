//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: ledger service wiring (journal, bus, custody) and the audit subscriber
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use coursemart_infra::LedgerConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &LedgerConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config)?);
    services::spawn_audit_subscriber(&services);
    Ok(router(services))
}

/// Router over already-built services.
pub fn router(services: Arc<services::AppServices>) -> Router {
    // Mutating routes: require an identity context.
    let protected = routes::protected_router().layer(axum::middleware::from_fn(
        middleware::identity_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}

use axum::Router;

pub mod admin;
pub mod common;
pub mod courses;
pub mod earnings;
pub mod payments;
pub mod students;
pub mod system;

/// Read-only endpoints (no identity required).
pub fn public_router() -> Router {
    Router::new()
        .merge(system::router())
        .merge(courses::public_router())
        .merge(students::public_router())
        .merge(earnings::public_router())
        .merge(admin::public_router())
}

/// Mutating endpoints (identity context required).
pub fn protected_router() -> Router {
    Router::new()
        .merge(courses::protected_router())
        .merge(students::protected_router())
        .merge(earnings::protected_router())
        .merge(admin::router())
        .merge(payments::router())
}

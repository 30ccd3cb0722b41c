use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use coursemart_marketplace::CallContext;

use crate::app::routes::common::{parse_course_id, parse_principal};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn public_router() -> Router {
    Router::new()
        .route("/students/:principal", get(get_student))
        .route("/students/:principal/courses", get(get_student_courses))
        .route("/enrollments/:course_id/:principal", get(get_enrollment))
}

pub fn protected_router() -> Router {
    Router::new().route("/students", post(register_student))
}

pub async fn register_student(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallContext>,
    Json(body): Json<dto::RegisterStudentRequest>,
) -> axum::response::Response {
    match services.ledger.register_student(&ctx, body.name) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "principal": ctx.caller() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_student(
    Extension(services): Extension<Arc<AppServices>>,
    Path(principal): Path<String>,
) -> axum::response::Response {
    let principal = match parse_principal(&principal) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.get_student(principal) {
        Ok(student) => Json(dto::StudentResponse::from(student)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_student_courses(
    Extension(services): Extension<Arc<AppServices>>,
    Path(principal): Path<String>,
) -> axum::response::Response {
    let principal = match parse_principal(&principal) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.get_student_courses(principal) {
        Ok(courses) => Json(courses).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_enrollment(
    Extension(services): Extension<Arc<AppServices>>,
    Path((course_id, principal)): Path<(String, String)>,
) -> axum::response::Response {
    let course_id = match parse_course_id(&course_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let principal = match parse_principal(&principal) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.get_enrollment(course_id, principal) {
        Ok(enrollment) => Json(dto::EnrollmentResponse::from(enrollment)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use coursemart_marketplace::CallContext;

use crate::app::routes::common::parse_course_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn public_router() -> Router {
    Router::new().route("/courses/:id", get(get_course))
}

pub fn protected_router() -> Router {
    Router::new()
        .route("/courses", post(create_course))
        .route("/courses/:id/enroll", post(enroll))
        .route("/courses/:id/complete", post(complete))
        .route("/courses/:id/toggle", post(toggle_status))
}

pub async fn create_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallContext>,
    Json(body): Json<dto::CreateCourseRequest>,
) -> axum::response::Response {
    let id = match services
        .ledger
        .create_course(&ctx, body.title, body.description, body.price)
    {
        Ok(id) => id,
        Err(e) => return errors::service_error_to_response(e),
    };

    (StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response()
}

pub async fn get_course(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let course_id = match parse_course_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.get_course(course_id) {
        Ok(course) => Json(dto::CourseResponse::from(course)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn enroll(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let course_id = match parse_course_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.enroll_in_course(&ctx, course_id) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn complete(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CompleteCourseRequest>,
) -> axum::response::Response {
    let course_id = match parse_course_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.complete_course(&ctx, course_id, body.rating) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn toggle_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let course_id = match parse_course_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.toggle_course_status(&ctx, course_id) {
        Ok(is_active) => Json(dto::CourseStatusResponse {
            id: course_id,
            is_active,
        })
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

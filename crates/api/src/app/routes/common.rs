use axum::http::StatusCode;
use axum::response::Response;

use coursemart_core::{CourseId, PrincipalId};

use crate::app::errors;

pub fn parse_course_id(raw: &str) -> Result<CourseId, Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid course id"))
}

pub fn parse_principal(raw: &str) -> Result<PrincipalId, Response> {
    raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid principal id")
    })
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::ErrorResponse;

/// Returns a JSON 404 response for unmatched routes.
pub async fn fallback_handler() -> Response {
    let body = ErrorResponse::from_status(StatusCode::NOT_FOUND, "No route matches this request");
    (StatusCode::NOT_FOUND, axum::Json(body)).into_response()
}

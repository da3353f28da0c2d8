use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    Busy,
    NoResults,
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    status: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, error, status) = match self {
            AppError::Busy => (
                StatusCode::CONFLICT,
                "Benchmark already running".to_string(),
                "busy",
            ),
            AppError::NoResults => (
                StatusCode::NOT_FOUND,
                "No results available. Run /benchmark first.".to_string(),
                "no_data",
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "invalid_request"),
        };
        (code, Json(ErrorResponse { error, status })).into_response()
    }
}

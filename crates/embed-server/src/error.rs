use std::path::PathBuf;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Hub error: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),

    #[error("Missing model file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EmbedError {
    pub(crate) fn tokenizer(e: impl std::fmt::Display) -> Self {
        EmbedError::Tokenizer(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EmbedError>;

#[derive(Debug)]
pub enum AppError {
    NotLoaded,
    NoTexts,
    BadRequest(String),
    Rejected(JsonRejection),
    Inference(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::NotLoaded => (StatusCode::SERVICE_UNAVAILABLE, "Model not loaded".to_string()),
            AppError::NoTexts => (StatusCode::BAD_REQUEST, "No texts provided".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Rejected(rejection) => (rejection.status(), rejection.body_text()),
            AppError::Inference(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected(rejection)
    }
}

impl From<EmbedError> for AppError {
    fn from(e: EmbedError) -> Self {
        AppError::Inference(e.to_string())
    }
}

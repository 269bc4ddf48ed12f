use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::pipeline::PipelineError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `NOT_FOUND`, `CONVERSION_ERROR`, `CREDENTIALS_ERROR`,
    /// `STORE_ERROR`, `PROCESSING_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "At least one image file is required")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    NotFound(String),
    Conversion(String),
    Credentials(String),
    Store(String),
    Processing(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Conversion(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONVERSION_ERROR", msg)
            }
            AppError::Credentials(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CREDENTIALS_ERROR", msg)
            }
            AppError::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", msg),
            AppError::Processing(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_ERROR", msg)
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        if status.is_server_error() {
            tracing::error!(code, "Request failed: {}", message);
        }

        (status, ErrorBody { code, message })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        match err {
            PipelineError::Validation(_) => AppError::Validation(message),
            PipelineError::Conversion(_) => AppError::Conversion(message),
            PipelineError::Credentials(_) => AppError::Credentials(message),
            PipelineError::Store(_) => AppError::Store(message),
            PipelineError::NotFound(_) => AppError::NotFound(message),
            PipelineError::Processing(_) => AppError::Processing(message),
        }
    }
}

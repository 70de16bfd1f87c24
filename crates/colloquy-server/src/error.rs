use std::any::Any;

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use colloquy_core::error::{AiError, ErrorCode};
use colloquy_core::models::envelope::ErrorEnvelope;

/// Unified API error type for the JSON route handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A classified pipeline failure.
    Domain(AiError),
    /// The request couldn't be read at all (malformed body, missing field).
    BadInput(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, envelope) = match self {
            ApiError::Domain(err) => (StatusCode::BAD_REQUEST, ErrorEnvelope::from(&err)),
            ApiError::BadInput(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorEnvelope::new(
                    ErrorCode::InvalidMessage,
                    ErrorCode::InvalidMessage.default_message(),
                    Some(msg),
                ),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorEnvelope::new(
                        ErrorCode::InternalError,
                        ErrorCode::InternalError.default_message(),
                        Some(msg),
                    ),
                )
            }
        };

        (status, Json(envelope)).into_response()
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        ApiError::Domain(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadInput(e.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        ApiError::BadInput(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadInput(e.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::BadInput(e.body_text())
    }
}

/// Render a handler panic as a 500 `INTERNAL_ERROR` envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Internal(detail).into_response()
}

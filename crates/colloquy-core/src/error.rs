use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Stable error codes exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    InvalidMessage,
    TimedOut,
    LlmError,
    TokenLimit,
    Unauthorized,
    FileProcessingError,
    RagError,
    InternalError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::InvalidMessage,
        ErrorCode::TimedOut,
        ErrorCode::LlmError,
        ErrorCode::TokenLimit,
        ErrorCode::Unauthorized,
        ErrorCode::FileProcessingError,
        ErrorCode::RagError,
        ErrorCode::InternalError,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidMessage => "INVALID_MESSAGE",
            ErrorCode::TimedOut => "TIMED_OUT",
            ErrorCode::LlmError => "LLM_ERROR",
            ErrorCode::TokenLimit => "TOKEN_LIMIT",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::FileProcessingError => "FILE_PROCESSING_ERROR",
            ErrorCode::RagError => "RAG_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Human-readable message used when the caller doesn't supply one.
    pub const fn default_message(self) -> &'static str {
        match self {
            ErrorCode::InvalidMessage => "Message wasn't valid or was empty",
            ErrorCode::TimedOut => "Chat response timed out",
            ErrorCode::LlmError => "Couldn't get a precise answer from LLM",
            ErrorCode::TokenLimit => "Reached the maximum amount of tokens",
            ErrorCode::Unauthorized => "The API key provided is invalid",
            ErrorCode::FileProcessingError => "Error processing uploaded file",
            ErrorCode::RagError => "Error in RAG operation",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure: stable code, human message, optional diagnostics.
///
/// Every stage of the pipeline returns this type so the HTTP boundary can
/// map codes to status without inspecting messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct AiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl AiError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn invalid_message() -> Self {
        Self::new(ErrorCode::InvalidMessage)
    }

    pub fn file_processing(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::FileProcessingError, message)
    }

    pub fn rag(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::RagError, message)
    }
}

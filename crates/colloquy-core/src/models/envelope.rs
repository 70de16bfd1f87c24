use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{AiError, ErrorCode};

/// Error body returned by every JSON endpoint on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
    /// Epoch milliseconds, taken when the envelope is built.
    #[ts(type = "number")]
    pub timestamp: i64,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            timestamp: jiff::Timestamp::now().as_millisecond(),
        }
    }
}

impl From<&AiError> for ErrorEnvelope {
    fn from(err: &AiError) -> Self {
        Self::new(err.code, err.message.clone(), err.details.clone())
    }
}

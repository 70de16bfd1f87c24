use thiserror::Error;

use colloquy_core::error::ErrorCode;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("request exceeds the model's token limit: {0}")]
    TokenLimit(String),

    #[error("credentials rejected: {0}")]
    Unauthorized(String),

    #[error("request throttled: {0}")]
    Throttled(String),
}

impl ProviderError {
    /// The wire code this failure should surface as, when it has a category
    /// of its own. Generic failures return `None` and are classified by the
    /// caller's call path.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ProviderError::TokenLimit(_) => Some(ErrorCode::TokenLimit),
            ProviderError::Unauthorized(_) => Some(ErrorCode::Unauthorized),
            ProviderError::Invocation(_)
            | ProviderError::ResponseParse(_)
            | ProviderError::Throttled(_) => None,
        }
    }

    /// Classify a service error by its AWS error code and message.
    pub fn from_service(code: Option<&str>, message: String) -> Self {
        match code {
            Some(
                "AccessDeniedException"
                | "UnrecognizedClientException"
                | "ExpiredTokenException"
                | "InvalidSignatureException",
            ) => ProviderError::Unauthorized(message),
            Some("ThrottlingException" | "ServiceUnavailableException") => {
                ProviderError::Throttled(message)
            }
            Some("ValidationException") if mentions_token_limit(&message) => {
                ProviderError::TokenLimit(message)
            }
            _ => ProviderError::Invocation(message),
        }
    }
}

fn mentions_token_limit(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("too many tokens")
        || lower.contains("input is too long")
        || lower.contains("prompt is too long")
        || lower.contains("max_tokens")
        || lower.contains("context window")
}

use async_trait::async_trait;

use colloquy_core::models::usage::TokenCount;

use crate::error::ProviderError;

/// One system + user exchange sent to a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

/// Generated text plus the tokens it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenCount,
}

/// Anything that turns a system + user prompt into generated text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Model identifier, used for logging.
    fn model_id(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError>;
}

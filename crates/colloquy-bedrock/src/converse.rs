//! Completion provider backed by the Bedrock Converse API.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::error::ProvideErrorMetadata;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, StopReason,
    SystemContentBlock,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ProviderError;
use crate::provider::{Completion, CompletionProvider, CompletionRequest};
use crate::tokens;

/// A Converse-API model bound to one inference profile.
#[derive(Clone)]
pub struct BedrockProvider {
    client: Client,
    model_id: String,
    max_tokens: Option<i32>,
}

impl BedrockProvider {
    pub fn new(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            max_tokens: None,
        }
    }

    /// Cap the number of generated tokens per call.
    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[async_trait]
impl CompletionProvider for BedrockProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let invocation_id = Uuid::new_v4();
        info!(invocation_id = %invocation_id, model = %self.model_id, "invoking converse");

        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(request.user.clone()))
            .build()
            .map_err(|e| ProviderError::Invocation(e.to_string()))?;

        let mut call = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(request.system.clone()))
            .messages(message);

        if let Some(max_tokens) = self.max_tokens {
            call = call.inference_config(
                InferenceConfiguration::builder()
                    .max_tokens(max_tokens)
                    .build(),
            );
        }

        let response = call.send().await.map_err(|e| {
            let err = e.into_service_error();
            let code = err.code().map(str::to_string);
            ProviderError::from_service(code.as_deref(), err.to_string())
        })?;

        if *response.stop_reason() == StopReason::MaxTokens {
            warn!(invocation_id = %invocation_id, "completion truncated at max tokens");
        }

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| ProviderError::ResponseParse("no message in response".to_string()))?;

        let text = output_message
            .content()
            .iter()
            .filter_map(|block| {
                if let ContentBlock::Text(text) = block {
                    Some(text.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        let usage = response
            .usage()
            .map(tokens::extract_token_usage)
            .unwrap_or_default();

        let cost_usd = tokens::get_pricing(&self.model_id)
            .map(|p| p.estimate_cost(usage))
            .unwrap_or(0.0);

        info!(
            invocation_id = %invocation_id,
            input_tokens = usage.input,
            output_tokens = usage.output,
            cost_usd,
            "converse complete"
        );

        Ok(Completion { text, usage })
    }
}

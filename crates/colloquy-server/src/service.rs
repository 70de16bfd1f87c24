//! Chat and agent orchestration.
//!
//! Every operation validates first, then makes exactly one completion call
//! under the configured deadline. Upload handling ingests and retrieves
//! before that call.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use colloquy_bedrock::error::ProviderError;
use colloquy_bedrock::provider::{CompletionProvider, CompletionRequest};
use colloquy_core::error::{AiError, ErrorCode};
use colloquy_core::models::prompt::PromptRequest;
use colloquy_core::models::response::ChatResponse;
use colloquy_core::models::upload::FileUpload;
use colloquy_core::persona::{Persona, rag_prompt};
use colloquy_core::validate::{resolve_conversation_id, validate_prompt};
use colloquy_rag::chunker::ChunkerConfig;
use colloquy_rag::ingest::ingest_file;
use colloquy_rag::retrieve::retrieve_context;
use colloquy_rag::store::{ChunkStore, SearchQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Deadline for a single completion call.
    pub request_timeout: Duration,
    /// Chunks retrieved per RAG question.
    pub top_k: usize,
    pub chunker: ChunkerConfig,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            top_k: 5,
            chunker: ChunkerConfig::default(),
        }
    }
}

/// Which call path a completion belongs to; decides how an unclassified
/// provider failure is reported.
#[derive(Debug, Clone, Copy)]
enum CallPath {
    Chat,
    Plan,
    Rag,
}

impl CallPath {
    fn wrap(self, err: ProviderError) -> AiError {
        let details = err.to_string();
        if let Some(code) = err.error_code() {
            return AiError::new(code).details(details);
        }
        let wrapped = match self {
            CallPath::Chat => AiError::new(ErrorCode::LlmError),
            CallPath::Plan => AiError::with_message(ErrorCode::LlmError, "Failed to create operation plan"),
            CallPath::Rag => AiError::new(ErrorCode::RagError),
        };
        wrapped.details(details)
    }
}

pub struct ChatService {
    provider: Arc<dyn CompletionProvider>,
    store: Arc<dyn ChunkStore>,
    settings: ServiceSettings,
}

impl ChatService {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn ChunkStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            provider,
            store,
            settings,
        }
    }

    /// Answer a prompt with the given persona's templates.
    pub async fn process_prompt(
        &self,
        request: &PromptRequest,
        persona: Persona,
    ) -> Result<ChatResponse, AiError> {
        let message = validate_prompt(Some(request))?;
        info!(user_id = ?request.user_id, ?persona, "processing prompt");

        let path = match persona {
            Persona::Planner => CallPath::Plan,
            Persona::CodeAssistant | Persona::Agent => CallPath::Chat,
        };
        let completion = CompletionRequest {
            system: persona.system_prompt().to_string(),
            user: persona.user_prompt(message),
        };

        let content = self.complete(&completion, path).await?;
        Ok(ChatResponse::success(request, content))
    }

    /// Answer a prompt against an already retrieved context block.
    pub async fn process_prompt_with_rag(
        &self,
        request: &PromptRequest,
        context: &str,
    ) -> Result<ChatResponse, AiError> {
        let message = validate_prompt(Some(request))?;
        info!(
            user_id = ?request.user_id,
            context_chars = context.len(),
            "processing prompt with RAG"
        );

        let completion = CompletionRequest {
            system: Persona::CodeAssistant.system_prompt().to_string(),
            user: rag_prompt(context, message),
        };

        let content = self.complete(&completion, CallPath::Rag).await?;
        Ok(ChatResponse::success(request, content))
    }

    pub async fn plan_operation(&self, request: &PromptRequest) -> Result<ChatResponse, AiError> {
        self.process_prompt(request, Persona::Planner).await
    }

    /// Ingest the attached file into the conversation, retrieve context for
    /// the question, and answer it.
    ///
    /// The conversation id is resolved once up front so the chunks, the
    /// retrieval scope and the response all agree on it.
    pub async fn process_upload(&self, upload: &FileUpload) -> Result<ChatResponse, AiError> {
        let message = validate_prompt(Some(&upload.prompt))?;

        let conversation_id = resolve_conversation_id(upload.prompt.conversation_id.as_deref());
        let prompt = PromptRequest {
            conversation_id: Some(conversation_id.clone()),
            ..upload.prompt.clone()
        };

        let outcome = ingest_file(
            self.store.as_ref(),
            upload,
            &conversation_id,
            &self.settings.chunker,
        )
        .await?;
        info!(
            file_name = %upload.file_name,
            conversation_id = %conversation_id,
            newly_stored = outcome.newly_stored,
            chunk_count = outcome.chunk_count,
            "file ingested"
        );

        let query = SearchQuery::new(message, self.settings.top_k).in_conversation(&conversation_id);
        let context = retrieve_context(self.store.as_ref(), &query).await;

        self.process_prompt_with_rag(&prompt, &context).await
    }

    async fn complete(&self, request: &CompletionRequest, path: CallPath) -> Result<String, AiError> {
        let deadline = self.settings.request_timeout;

        match tokio::time::timeout(deadline, self.provider.complete(request)).await {
            Ok(Ok(completion)) => {
                info!(
                    model_id = self.provider.model_id(),
                    input_tokens = completion.usage.input,
                    output_tokens = completion.usage.output,
                    "completion received"
                );
                Ok(completion.text)
            }
            Ok(Err(e)) => {
                error!(model_id = self.provider.model_id(), error = %e, ?path, "completion failed");
                Err(path.wrap(e))
            }
            Err(_) => {
                error!(
                    model_id = self.provider.model_id(),
                    timeout_ms = deadline.as_millis() as u64,
                    "completion timed out"
                );
                Err(AiError::new(ErrorCode::TimedOut)
                    .details(format!("no response within {}ms", deadline.as_millis())))
            }
        }
    }
}

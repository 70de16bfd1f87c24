use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::prompt::PromptRequest;
use crate::error::AiError;
use crate::validate::resolve_conversation_id;

/// Response returned to the chat frontend for every prompt.
///
/// `error` is serialized as `null` on success; the frontend relies on the
/// key being present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChatResponse {
    pub message: Option<String>,
    pub content: Option<String>,
    pub conversation_id: String,
    pub user_id: Option<String>,
    pub timestamp: jiff::Timestamp,
    pub message_id: String,
    pub success: bool,
    pub error: Option<String>,
}

impl ChatResponse {
    /// Wrap model output, stamping a fresh message id and resolving the
    /// conversation id.
    pub fn success(request: &PromptRequest, content: String) -> Self {
        Self {
            message: request.message.clone(),
            content: Some(content),
            conversation_id: resolve_conversation_id(request.conversation_id.as_deref()),
            user_id: request.user_id.clone(),
            timestamp: jiff::Timestamp::now(),
            message_id: Uuid::new_v4().to_string(),
            success: true,
            error: None,
        }
    }

    /// A failed exchange that still carries whatever identifiers were known.
    pub fn failure(request: &PromptRequest, error: &AiError) -> Self {
        let error = match &error.details {
            Some(details) => format!("{error} ({details})"),
            None => error.to_string(),
        };

        Self {
            message: request.message.clone(),
            content: None,
            conversation_id: resolve_conversation_id(request.conversation_id.as_deref()),
            user_id: request.user_id.clone(),
            timestamp: jiff::Timestamp::now(),
            message_id: Uuid::new_v4().to_string(),
            success: false,
            error: Some(error),
        }
    }
}

/// Returned by the new-chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewConversation {
    pub chat_id: String,
}

impl NewConversation {
    pub fn generate() -> Self {
        Self {
            chat_id: Uuid::new_v4().to_string(),
        }
    }
}

use uuid::Uuid;

use crate::error::AiError;
use crate::models::prompt::PromptRequest;

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 9_999;

/// Check that a prompt carries a usable message and return it.
///
/// Fails with `INVALID_MESSAGE` when the request is absent or its message is
/// missing, blank, or too long. Other fields pass through untouched.
pub fn validate_prompt(request: Option<&PromptRequest>) -> Result<&str, AiError> {
    let message = request
        .and_then(|r| r.message.as_deref())
        .ok_or_else(AiError::invalid_message)?;

    if message.trim().is_empty() {
        return Err(AiError::invalid_message());
    }

    let chars = message.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(AiError::invalid_message().details(format!(
            "message has {chars} characters, limit is {MAX_MESSAGE_CHARS}"
        )));
    }

    Ok(message)
}

/// The caller's conversation id, or a fresh UUID when it is missing or blank.
pub fn resolve_conversation_id(conversation_id: Option<&str>) -> String {
    match conversation_id {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

use axum::Json;
use axum::Router;
use axum::extract::multipart::Field;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use tracing::{info, warn};

use colloquy_core::models::prompt::PromptRequest;
use colloquy_core::models::response::{ChatResponse, NewConversation};
use colloquy_core::models::upload::{FileUpload, MAX_FILE_SIZE};
use colloquy_core::persona::Persona;
use colloquy_core::validate::resolve_conversation_id;

use crate::error::ApiError;
use crate::state::AppState;

pub const HEALTH_MESSAGE: &str = "Chat service is healthy";

/// Chat routes, mounted under both `/chat` and `/api/chat`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/prompt", post(prompt))
        .route(
            "/prompt-with-file",
            // Upload size is enforced while the file field streams in.
            post(prompt_with_file).layer(DefaultBodyLimit::disable()),
        )
        .route("/agent", post(agent))
        .route("/new", post(new_conversation))
        .route("/health", get(health))
}

pub async fn prompt(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    info!(user_id = ?request.user_id, "received chat prompt");
    let response = state.chat.process_prompt(&request, Persona::CodeAssistant).await?;
    Ok(Json(response))
}

pub async fn agent(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    info!(user_id = ?request.user_id, "received agent prompt");
    let response = state.chat.process_prompt(&request, Persona::Agent).await?;
    Ok(Json(response))
}

/// `userId` and `conversationId` may arrive as query parameters instead of
/// multipart fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    pub user_id: Option<String>,
    pub conversation_id: Option<String>,
}

/// Answer a question about an attached file.
///
/// Pipeline failures come back as a 500 carrying a `ChatResponse` with
/// `success: false`, not as an error envelope; the chat UI reads this shape.
/// A request that can't be read as multipart gets the usual error envelope.
pub async fn prompt_with_file(
    State(state): State<AppState>,
    params: Result<Query<UploadParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let mut multipart = multipart?;
    let mut upload = read_upload(&mut multipart, params).await?;

    // Resolved here so a failure response names the conversation the file
    // may already be stored under.
    upload.prompt.conversation_id = Some(resolve_conversation_id(
        upload.prompt.conversation_id.as_deref(),
    ));
    info!(
        file_name = %upload.file_name,
        mime_type = ?upload.mime_type,
        bytes = upload.size(),
        "received chat prompt with file"
    );

    match state.chat.process_upload(&upload).await {
        Ok(response) => Ok(Json(response).into_response()),
        Err(e) => {
            warn!(code = %e.code, error = %e.message, "file prompt failed");
            let body = ChatResponse::failure(&upload.prompt, &e);
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

pub async fn new_conversation() -> Json<NewConversation> {
    let conversation = NewConversation::generate();
    info!(chat_id = %conversation.chat_id, "created conversation");
    Json(conversation)
}

pub async fn health() -> &'static str {
    HEALTH_MESSAGE
}

async fn read_upload(multipart: &mut Multipart, params: UploadParams) -> Result<FileUpload, ApiError> {
    let mut prompt = PromptRequest {
        message: None,
        user_id: params.user_id,
        conversation_id: params.conversation_id,
    };
    let mut file = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "message" => prompt.message = Some(field.text().await?),
            "userId" => prompt.user_id = Some(field.text().await?),
            "conversationId" => prompt.conversation_id = Some(field.text().await?),
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field.content_type().map(str::to_string);
                let (bytes, total) = read_capped(&mut field).await?;
                if total > MAX_FILE_SIZE {
                    warn!(file_name = %file_name, bytes = total, "upload exceeds size limit");
                }
                file = Some((file_name, mime_type, bytes));
            }
            _ => {}
        }
    }

    let Some((file_name, mime_type, bytes)) = file else {
        return Err(ApiError::BadInput("missing multipart field `file`".to_string()));
    };

    Ok(FileUpload {
        prompt,
        file_name,
        mime_type,
        bytes,
    })
}

/// Read a field, keeping at most `MAX_FILE_SIZE + 1` bytes so validation
/// can still see that it is oversized. The rest is read and dropped, leaving
/// later fields readable. Returns the kept bytes and the full field length.
async fn read_capped(field: &mut Field<'_>) -> Result<(Vec<u8>, usize), ApiError> {
    let mut bytes = Vec::new();
    let mut total = 0;
    while let Some(chunk) = field.chunk().await? {
        total += chunk.len();
        let room = (MAX_FILE_SIZE + 1).saturating_sub(bytes.len());
        bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    Ok((bytes, total))
}

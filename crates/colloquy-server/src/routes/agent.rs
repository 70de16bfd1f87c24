use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use tracing::info;

use colloquy_core::models::prompt::PromptRequest;
use colloquy_core::models::response::ChatResponse;
use colloquy_core::persona::Persona;

use crate::error::ApiError;
use crate::state::AppState;

pub const HEALTH_MESSAGE: &str = "Agent service is operational";

/// Agent routes, mounted under `/api/agent`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(request))
        .route("/plan", post(plan))
        .route("/health", get(health))
}

pub async fn request(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    info!(user_id = ?request.user_id, "processing agent request");
    Ok(Json(state.chat.process_prompt(&request, Persona::Agent).await?))
}

pub async fn plan(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    info!(user_id = ?request.user_id, "planning operation");
    Ok(Json(state.chat.plan_operation(&request).await?))
}

pub async fn health() -> &'static str {
    HEALTH_MESSAGE
}

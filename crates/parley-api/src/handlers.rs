//! Route handler functions for all API endpoints.
//!
//! Handlers are thin: they extract the request, hand it to the dispatcher,
//! and shape the JSON response. All chat semantics live in `parley-chat`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_chat::{ChatRequest, ChatResponse, ConversationSummary, Turn};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
    pub turn_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub default_model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub provider: String,
    pub active_conversations: usize,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Chat
// =============================================================================

/// POST /chat - classify and answer one message.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.dispatcher.handle(request).await?;
    Ok(Json(response))
}

// =============================================================================
// Conversations
// =============================================================================

/// GET /conversations - one summary per known session.
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<ConversationListResponse>, ApiError> {
    let conversations = state.dispatcher.conversations()?;
    Ok(Json(ConversationListResponse {
        total: conversations.len(),
        conversations,
    }))
}

/// GET /conversations/{session_id} - full history; empty if the session is unseen.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let turns = state.dispatcher.history(&session_id)?;
    Ok(Json(ConversationResponse {
        session_id,
        turn_count: turns.len(),
        turns,
    }))
}

// =============================================================================
// Models and health
// =============================================================================

/// GET /models - models a caller may request.
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.dispatcher.supported_models().to_vec(),
        default_model: state.dispatcher.default_model().to_string(),
    })
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let active_conversations = state.dispatcher.conversations()?.len();
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        provider: state.provider.to_string(),
        active_conversations,
        timestamp: Utc::now(),
    }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("no such endpoint".to_string())
}

//! Chat handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, AppState};
use crate::middleware::auth::UserContext;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Send one message to the AI doctor assistant
pub async fn send(
    State(state): State<AppState>,
    user: UserContext,
    Json(req): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    if req.message.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Please type a message before sending".to_string(),
        ));
    }

    let reply = state
        .chat
        .send_message(&state.pool, user.user_id, &req.message)
        .await?;

    Ok(Json(ChatResponse { reply }))
}

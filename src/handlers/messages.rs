use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::BookingDetails;
use crate::services::conversation::{self, TurnReply};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Values already known when the dialog starts. Ignored on a running session.
    #[serde(default)]
    pub booking: Option<BookingDetails>,
}

// POST /api/messages
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IncomingMessage>,
) -> Result<Json<TurnReply>, AppError> {
    let session_id = payload
        .session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let message = payload.message.trim().to_string();

    tracing::info!(session = %session_id, message = %message, "incoming message");

    let reply = conversation::process_message(&state, &session_id, &message, payload.booking)?;

    tracing::info!(
        session = %reply.session_id,
        status = ?reply.status,
        replies = reply.replies.len(),
        "turn complete"
    );

    Ok(Json(reply))
}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::BookingDetails;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionView {
    pub session_id: String,
    /// Active dialogs, bottom of the stack first.
    pub dialogs: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingDetails>,
    pub last_activity: String,
    pub expires_at: String,
}

// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let now = (state.clock)();
    let session = {
        let db = state.conn()?;
        queries::get_session(&db, &id, &now)?
    }
    .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;

    Ok(Json(SessionView {
        dialogs: session.stack.frames().iter().map(|f| f.name()).collect(),
        pending_prompt: session.stack.pending_prompt().map(|p| p.text.clone()),
        booking: session.stack.booking().cloned(),
        last_activity: session.last_activity.format("%Y-%m-%d %H:%M:%S").to_string(),
        expires_at: session.expires_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        session_id: session.id,
    }))
}

// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = {
        let db = state.conn()?;
        queries::delete_session(&db, &id)?
    };

    if deleted {
        tracing::info!(session = %id, "session discarded");
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("session {id}")))
    }
}

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::db::queries;
use crate::dialogs::orchestrator::{DialogStack, TurnOutcome};
use crate::dialogs::TurnContext;
use crate::errors::AppError;
use crate::models::{BookingDetails, DialogSession};
use crate::services::interruption::{self, Interruption, CANCEL_MESSAGE, HELP_MESSAGE};
use crate::state::AppState;

const DECLINED_MESSAGE: &str = "Okay, I won't set up that meeting.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Prompting,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub session_id: String,
    pub replies: Vec<String>,
    pub status: TurnStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingDetails>,
}

/// Runs one user turn against the session's dialog stack.
///
/// An unknown or expired session starts a new booking waterfall, prefilled
/// from `prefill`; the opening message only triggers it.
///
/// The connection lock is held from load to save, so turns on one session
/// never interleave.
pub fn process_message(
    state: &Arc<AppState>,
    session_id: &str,
    message: &str,
    prefill: Option<BookingDetails>,
) -> Result<TurnReply, AppError> {
    let now = (state.clock)();
    let expires_at = Duration::try_minutes(state.config.session_ttl_minutes)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "session ttl of {} minutes is out of range",
                state.config.session_ttl_minutes
            )
        })?;

    let db = state.conn()?;
    let existing = queries::get_session(&db, session_id, &now)?;

    let ctx = TurnContext {
        now,
        recognizer: state.recognizer.as_ref(),
    };
    let mut replies = Vec::new();

    let (mut session, outcome) = match existing {
        None => {
            let mut options = prefill.unwrap_or_default();
            options.meeting_date_msg = None;
            options.version = 0;

            tracing::info!(session = session_id, "starting booking dialog");
            let mut session = new_session(session_id, now, expires_at);
            let outcome = session.stack.begin(options, &ctx);
            (session, outcome)
        }
        Some(mut session) => {
            if message.is_empty() {
                return Err(AppError::BadRequest("message must not be empty".to_string()));
            }
            if prefill.is_some() {
                tracing::debug!(session = session_id, "dialog already running, ignoring prefill");
            }

            let outcome = match interruption::detect(message) {
                Some(Interruption::Cancel) => {
                    replies.push(CANCEL_MESSAGE.to_string());
                    session.stack.cancel_all()
                }
                Some(Interruption::Help) => {
                    replies.push(HELP_MESSAGE.to_string());
                    match session.stack.pending_prompt() {
                        Some(prompt) => TurnOutcome::Prompting(prompt.clone()),
                        None => session.stack.cancel_all(),
                    }
                }
                None => session.stack.continue_with(message, &ctx),
            };
            (session, outcome)
        }
    };

    let (status, booking) = match outcome {
        TurnOutcome::Prompting(prompt) => {
            replies.push(prompt.text);
            (TurnStatus::Prompting, None)
        }
        TurnOutcome::Completed(details) => {
            tracing::info!(
                session = session_id,
                subject = details.subject.as_deref().unwrap_or_default(),
                attendee = details.attendee.as_deref().unwrap_or_default(),
                meeting = details.meeting_date_time.as_deref().unwrap_or_default(),
                "booking confirmed"
            );
            replies.push(summary(&details));
            (TurnStatus::Completed, Some(details))
        }
        TurnOutcome::Cancelled => {
            tracing::info!(session = session_id, "booking dialog ended without a booking");
            if replies.is_empty() {
                replies.push(DECLINED_MESSAGE.to_string());
            }
            (TurnStatus::Cancelled, None)
        }
    };

    if status == TurnStatus::Prompting {
        session.last_activity = now;
        session.expires_at = expires_at;
        queries::save_session(&db, &session)?;
    } else {
        queries::delete_session(&db, &session.id)?;
    }

    match queries::expire_old_sessions(&db, &now) {
        Ok(0) => {}
        Ok(count) => tracing::debug!(count, "expired idle sessions"),
        Err(e) => tracing::warn!(error = %e, "failed to expire idle sessions"),
    }
    drop(db);

    Ok(TurnReply {
        session_id: session.id,
        replies,
        status,
        booking,
    })
}

fn new_session(id: &str, now: NaiveDateTime, expires_at: NaiveDateTime) -> DialogSession {
    DialogSession {
        id: id.to_string(),
        stack: DialogStack::default(),
        last_activity: now,
        expires_at,
    }
}

fn summary(details: &BookingDetails) -> String {
    format!(
        "All set: {} with {} ({}) on {}.",
        details.subject.as_deref().unwrap_or_default(),
        details.attendee.as_deref().unwrap_or_default(),
        details.email.as_deref().unwrap_or_default(),
        details.meeting_date_msg.as_deref().unwrap_or_default(),
    )
}

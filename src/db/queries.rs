use anyhow::Context;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::models::DialogSession;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Dialog sessions ──

/// Loads a session that has not yet expired at `now`.
pub fn get_session(
    conn: &Connection,
    id: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<Option<DialogSession>> {
    let now = now.format(TIMESTAMP_FORMAT).to_string();
    let result = conn.query_row(
        "SELECT id, stack, last_activity, expires_at FROM dialog_sessions WHERE id = ?1 AND expires_at > ?2",
        params![id, now],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((id, stack_json, last_activity_str, expires_at_str)) => {
            let stack = serde_json::from_str(&stack_json)
                .with_context(|| format!("corrupt dialog stack for session {id}"))?;
            let last_activity = NaiveDateTime::parse_from_str(&last_activity_str, TIMESTAMP_FORMAT)
                .context("invalid last_activity timestamp")?;
            let expires_at = NaiveDateTime::parse_from_str(&expires_at_str, TIMESTAMP_FORMAT)
                .context("invalid expires_at timestamp")?;

            Ok(Some(DialogSession {
                id,
                stack,
                last_activity,
                expires_at,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_session(conn: &Connection, session: &DialogSession) -> anyhow::Result<()> {
    let stack_json = serde_json::to_string(&session.stack)?;
    let last_activity = session.last_activity.format(TIMESTAMP_FORMAT).to_string();
    let expires_at = session.expires_at.format(TIMESTAMP_FORMAT).to_string();

    conn.execute(
        "INSERT INTO dialog_sessions (id, stack, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           stack = excluded.stack,
           last_activity = excluded.last_activity,
           expires_at = excluded.expires_at",
        params![session.id, stack_json, last_activity, expires_at],
    )?;
    Ok(())
}

pub fn delete_session(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM dialog_sessions WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn expire_old_sessions(conn: &Connection, now: &NaiveDateTime) -> anyhow::Result<usize> {
    let now = now.format(TIMESTAMP_FORMAT).to_string();
    let count = conn.execute(
        "DELETE FROM dialog_sessions WHERE expires_at <= ?1",
        params![now],
    )?;
    Ok(count)
}

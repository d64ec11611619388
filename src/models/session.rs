use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dialogs::orchestrator::DialogStack;

/// One user's conversation: the suspended dialog stack plus its expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogSession {
    pub id: String,
    pub stack: DialogStack,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::recognizer::DateTimeRecognizer;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub recognizer: Box<dyn DateTimeRecognizer>,
    /// Reference instant for date recognition and session expiry.
    pub clock: fn() -> NaiveDateTime,
}

impl AppState {
    pub fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }
}

use std::env;

const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;
/// One year.
const MAX_SESSION_TTL_MINUTES: i64 = 525_600;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub session_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "meetbook.db".to_string()),
            session_ttl_minutes: session_ttl_minutes(env::var("SESSION_TTL_MINUTES").ok()),
        }
    }
}

fn session_ttl_minutes(raw: Option<String>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_SESSION_TTL_MINUTES;
    };
    match raw.trim().parse::<i64>() {
        Ok(minutes) if (1..=MAX_SESSION_TTL_MINUTES).contains(&minutes) => minutes,
        _ => {
            tracing::warn!(
                value = %raw,
                max = MAX_SESSION_TTL_MINUTES,
                "SESSION_TTL_MINUTES out of range, using default"
            );
            DEFAULT_SESSION_TTL_MINUTES
        }
    }
}

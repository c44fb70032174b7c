use anyhow::{Context, Result};

use crate::session::SessionConfig;

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Key for session payload obfuscation (not encryption).
    pub obfuscation_key: String,
    pub session: SessionConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = SessionConfig::default();
        Ok(Config {
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            obfuscation_key: std::env::var("SESSION_OBFUSCATION_KEY")
                .unwrap_or_else(|_| "burnish-dev-obfuscation-key".to_string()),
            session: SessionConfig {
                max_age_ms: env_or("SESSION_MAX_AGE_MS", defaults.max_age_ms)?,
                inactivity_timeout_ms: env_or(
                    "SESSION_INACTIVITY_TIMEOUT_MS",
                    defaults.inactivity_timeout_ms,
                )?,
                max_sessions: env_or("SESSION_MAX_SESSIONS", defaults.max_sessions)?,
                cleanup_interval_ms: env_or(
                    "SESSION_CLEANUP_INTERVAL_MS",
                    defaults.cleanup_interval_ms,
                )?,
                activity_throttle_ms: env_or(
                    "SESSION_ACTIVITY_THROTTLE_MS",
                    defaults.activity_throttle_ms,
                )?,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid value")),
        Err(_) => Ok(default),
    }
}

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Optional. When set, the request throttle counts in Redis so multiple
    /// instances share a window; otherwise an in-process counter is used.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Mutating copilot requests allowed per user per minute.
    pub throttle_per_minute: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: std::env::var("REDIS_URL").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            throttle_per_minute: std::env::var("COPILOT_THROTTLE_PER_MINUTE")
                .unwrap_or_else(|_| "60".to_string())
                .parse::<u64>()
                .context("COPILOT_THROTTLE_PER_MINUTE must be a number")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

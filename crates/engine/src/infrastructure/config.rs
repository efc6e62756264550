//! Application configuration

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection URL
    pub database_url: String,
    /// Per-call deadline for persistence operations, in seconds
    pub db_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("PLOTLOOM_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://plotloom.db".to_string()),
            db_timeout_secs: env::var("PLOTLOOM_DB_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("PLOTLOOM_DB_TIMEOUT_SECS must be a number of seconds")?,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://plotloom.db".to_string(),
            db_timeout_secs: 10,
        }
    }
}

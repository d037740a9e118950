// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use crate::services::clerk::DEFAULT_API_URL;
use crate::services::signature::DEFAULT_TOLERANCE_SECS;
use std::env;
use std::time::Duration;

pub const DEFAULT_WEBHOOK_PATH: &str = "/webhooks/identity";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// Path the identity provider delivers webhooks to
    pub webhook_path: String,
    /// Allowed CORS origin
    pub frontend_url: String,
    /// Identity provider API base URL
    pub clerk_api_url: String,
    /// Postgres URL; `None` selects the in-memory store
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Upper bound on a single identity provider fetch
    pub provider_timeout: Duration,
    /// Allowed skew of `svix-timestamp` against our clock
    pub webhook_tolerance_secs: i64,

    // --- Secrets ---
    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: String,
    /// Identity provider backend API key
    pub clerk_secret_key: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            clerk_api_url: DEFAULT_API_URL.to_string(),
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            webhook_tolerance_secs: DEFAULT_TOLERANCE_SECS,
            webhook_secret: "whsec_dGVzdF93ZWJob29rX3NpZ25pbmdfa2V5".to_string(),
            clerk_secret_key: "sk_test_key".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: parse_or("PORT", DEFAULT_PORT),
            webhook_path: env::var("WEBHOOK_PATH")
                .unwrap_or_else(|_| DEFAULT_WEBHOOK_PATH.to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            clerk_api_url: env::var("CLERK_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            ),
            provider_timeout: Duration::from_secs(parse_or(
                "PROVIDER_TIMEOUT_SECS",
                DEFAULT_PROVIDER_TIMEOUT_SECS,
            )),
            webhook_tolerance_secs: parse_or("WEBHOOK_TOLERANCE_SECS", DEFAULT_TOLERANCE_SECS),

            // A present-but-empty secret is caught per request as MissingSecret
            webhook_secret: env::var("WEBHOOK_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("WEBHOOK_SECRET"))?,
            clerk_secret_key: env::var("CLERK_SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("CLERK_SECRET_KEY"))?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("WEBHOOK_SECRET", " whsec_c2VjcmV0 ");
        env::set_var("CLERK_SECRET_KEY", "sk_test_123");
        env::set_var("PROVIDER_TIMEOUT_SECS", "not-a-number");
        env::set_var("WEBHOOK_TOLERANCE_SECS", "60");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.webhook_secret, "whsec_c2VjcmV0");
        assert_eq!(config.clerk_secret_key, "sk_test_123");
        assert_eq!(config.port, 8080);
        assert_eq!(config.provider_timeout, Duration::from_secs(10));
        assert_eq!(config.webhook_tolerance_secs, 60);
        assert_eq!(config.webhook_path, DEFAULT_WEBHOOK_PATH);
    }
}

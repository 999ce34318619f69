use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default suitable for local development.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub catalog_path: String,
    pub port: u16,
    pub rust_log: String,
    /// Enables the real OpenAI client when set.
    pub openai_api_key: Option<String>,
    pub openai_api_url: Option<String>,
    pub cookie_secure: bool,
    pub inference_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: env_or("DATABASE_URL", "sqlite://data/db.sqlite?mode=rwc"),
            catalog_path: env_or("CATALOG_PATH", "data/config.json"),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_api_url: optional_env("OPENAI_API_URL"),
            cookie_secure: parse_flag(&env_or("COOKIE_SECURE", "false"))
                .context("COOKIE_SECURE must be true or false")?,
            inference_timeout: Duration::from_millis(
                env_or("INFERENCE_TIMEOUT_MS", "15000")
                    .parse::<u64>()
                    .context("INFERENCE_TIMEOUT_MS must be a number of milliseconds")?,
            ),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            catalog_path: "data/config.json".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            openai_api_key: None,
            openai_api_url: None,
            cookie_secure: false,
            inference_timeout: Duration::from_millis(15_000),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank both mean "not configured".
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("unrecognised flag value '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag(" 1 ").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}

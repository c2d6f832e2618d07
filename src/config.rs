//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_ENGINE_HTTP_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_POLL_MAX_ATTEMPTS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub judge: JudgeConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// JWT authentication configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

/// Judge dispatch and polling configuration
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Polling rounds before a submission times out
    pub poll_max_attempts: u32,
    /// Delay between polling rounds in milliseconds
    pub poll_interval_ms: u64,
    /// Per-request timeout for the execution engine
    pub http_timeout_secs: u64,
    /// Probe the engine before dispatching test cases
    pub liveness_probe: bool,
}

impl JudgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            http_timeout_secs: DEFAULT_ENGINE_HTTP_TIMEOUT_SECS,
            liveness_probe: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            judge: JudgeConfig::from_env()?,
        })
    }
}

/// Read an optional variable, falling back to `default` when it is unset
fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parse_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?,
            max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        })
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET".to_string()))?,
        })
    }
}

impl JudgeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            poll_max_attempts: parse_or("JUDGE_POLL_MAX_ATTEMPTS", DEFAULT_POLL_MAX_ATTEMPTS)?,
            poll_interval_ms: parse_or("JUDGE_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            http_timeout_secs: parse_or(
                "JUDGE_HTTP_TIMEOUT_SECS",
                DEFAULT_ENGINE_HTTP_TIMEOUT_SECS,
            )?,
            liveness_probe: parse_or("JUDGE_LIVENESS_PROBE", true)?,
        };

        if config.poll_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("JUDGE_POLL_MAX_ATTEMPTS".to_string()));
        }

        Ok(config)
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_defaults() {
        let judge = JudgeConfig::default();
        assert_eq!(judge.poll_max_attempts, 30);
        assert_eq!(judge.poll_interval(), Duration::from_secs(2));
        assert_eq!(judge.http_timeout(), Duration::from_secs(10));
        assert!(judge.liveness_probe);
    }

    #[test]
    fn test_parse_or_falls_back_when_unset() {
        let port: u16 = parse_or("JUDGEFLOW_TEST_UNSET_PORT", 9090).unwrap();
        assert_eq!(port, 9090);
    }
}

//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

use interview_core::question_source::DEFAULT_FALLBACK_POOL_SIZE;
use interview_core::uploads::DEFAULT_MAX_UPLOAD_BYTES;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub ml_service_url: String,
    pub ml_timeout_secs: u64,
    pub storage_root: PathBuf,
    pub storage_bucket: String,
    pub public_base_url: String,
    pub fallback_pool_size: usize,
    pub max_upload_bytes: usize,
    pub cors_origin: String,
    pub auth_session_ttl_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address: SocketAddr = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load ML Service Settings ---
        let ml_service_url = std::env::var("ML_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();
        let ml_timeout_secs: u64 = parse_var("ML_SERVICE_TIMEOUT_SECS", "30")?;

        // --- Load Storage Settings ---
        let storage_root = std::env::var("STORAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./storage"));
        let storage_bucket =
            std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "voice-answers".to_string());
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();
        let max_upload_bytes: usize =
            parse_var("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())?;

        // --- Load Interview Settings ---
        let fallback_pool_size: usize =
            parse_var("FALLBACK_POOL_SIZE", &DEFAULT_FALLBACK_POOL_SIZE.to_string())?;
        if fallback_pool_size == 0 {
            return Err(ConfigError::InvalidValue(
                "FALLBACK_POOL_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let auth_session_ttl_days: i64 = parse_var("AUTH_SESSION_TTL_DAYS", "30")?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            ml_service_url,
            ml_timeout_secs,
            storage_root,
            storage_bucket,
            public_base_url,
            fallback_pool_size,
            max_upload_bytes,
            cors_origin,
            auth_session_ttl_days,
        })
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "DATABASE_URL",
        "BIND_ADDRESS",
        "ML_SERVICE_URL",
        "FALLBACK_POOL_SIZE",
        "ML_SERVICE_TIMEOUT_SECS",
        "RUST_LOG",
    ];

    fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_when_only_database_url_is_set() {
        clear();
        std::env::set_var("DATABASE_URL", "postgres://localhost/interviews");

        let config = Config::from_env().unwrap();

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.ml_service_url, "http://localhost:8000");
        assert_eq!(config.fallback_pool_size, 10);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.ml_timeout_secs, 30);
        clear();
    }

    #[test]
    #[serial]
    fn missing_database_url_is_reported() {
        clear();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "DATABASE_URL"));
    }

    #[test]
    #[serial]
    fn invalid_numbers_are_rejected() {
        clear();
        std::env::set_var("DATABASE_URL", "postgres://localhost/interviews");
        std::env::set_var("FALLBACK_POOL_SIZE", "lots");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "FALLBACK_POOL_SIZE"));

        std::env::set_var("FALLBACK_POOL_SIZE", "0");
        assert!(Config::from_env().is_err());
        clear();
    }

    #[test]
    #[serial]
    fn trailing_slash_is_trimmed_from_ml_url() {
        clear();
        std::env::set_var("DATABASE_URL", "postgres://localhost/interviews");
        std::env::set_var("ML_SERVICE_URL", "http://ml:8000/");
        assert_eq!(Config::from_env().unwrap().ml_service_url, "http://ml:8000");
        clear();
    }
}

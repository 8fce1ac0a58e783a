//! Cart API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cart API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port (`CART_API_PORT`, default 8080)
    pub port: u16,

    /// SQLite database file (`CARTLEDGER_DB_PATH`, default ./cartledger.db)
    pub database_path: PathBuf,

    /// Pool size (`CARTLEDGER_DB_MAX_CONNECTIONS`, default 5)
    pub db_max_connections: u32,

    /// Engine conflict retries (`CARTLEDGER_MAX_CONFLICT_RETRIES`, default 3)
    pub max_conflict_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            port: 8080,
            database_path: PathBuf::from("./cartledger.db"),
            db_max_connections: 5,
            max_conflict_retries: 3,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (environment, map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            port: parse_or(&lookup, "CART_API_PORT", defaults.port)?,

            database_path: lookup("CARTLEDGER_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_or(
                &lookup,
                "CARTLEDGER_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,

            max_conflict_retries: parse_or(
                &lookup,
                "CARTLEDGER_MAX_CONFLICT_RETRIES",
                defaults.max_conflict_retries,
            )?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CARTLEDGER_DB_MAX_CONNECTIONS".to_string(),
                value: "0".to_string(),
            });
        }

        if config.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("CARTLEDGER_DB_PATH".to_string()));
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

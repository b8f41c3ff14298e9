//! Application settings loaded from `config.toml`.
//!
//! Every section and key is optional; anything left out falls back to its default. A missing
//! file is not an error, an unreadable or malformed one is.

use crate::core::saldo::InvalidRecordPolicy;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Saldo calculation settings
    pub saldo: SaldoConfig,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP API binds to
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// `[saldo]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SaldoConfig {
    /// What to do with records whose timestamps are missing or malformed
    pub invalid_records: InvalidRecordPolicy,
    /// Number of change events the change feed buffers before writers wait
    pub change_feed_capacity: usize,
}

impl Default for SaldoConfig {
    fn default() -> Self {
        Self {
            invalid_records: InvalidRecordPolicy::default(),
            change_feed_capacity: 256,
        }
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file exists but cannot be read, or if the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        info!("No config file at {path_ref:?}, using defaults");
        return Ok(AppConfig::default());
    }

    debug!("Loading configuration from {path_ref:?}");
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.saldo.change_feed_capacity == 0 {
        return Err(Error::Config {
            message: "saldo.change_feed_capacity must be greater than zero".to_string(),
        });
    }

    Ok(config)
}

/// Loads settings from `CONFIG_PATH`, or `./config.toml` when the variable is not set.
pub fn load_default_config() -> Result<AppConfig> {
    let path = super::env_or_default("CONFIG_PATH", DEFAULT_CONFIG_PATH)?;
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [server]
            bind_address = "127.0.0.1:9000"

            [saldo]
            invalid_records = "reject"
            change_feed_capacity = 16
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.saldo.invalid_records, InvalidRecordPolicy::Reject);
        assert_eq!(config.saldo.change_feed_capacity, 16);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.saldo.invalid_records, InvalidRecordPolicy::Skip);
        assert_eq!(config.saldo.change_feed_capacity, 256);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = parse_config("[saldo]\ninvalid_records = \"ignore\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = parse_config("[saldo]\nchange_feed_capacity = 0\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config("definitely/not/here/config.toml").unwrap();
        assert_eq!(config.saldo.change_feed_capacity, 256);
    }
}

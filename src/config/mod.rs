/// Database connection and table creation
pub mod database;

/// Application settings from config.toml
pub mod settings;

pub use settings::{AppConfig, load_config, load_default_config};

use crate::errors::Result;
use std::env::VarError;

/// Reads an environment variable, falling back to `default` when it is not set.
///
/// # Errors
/// Returns [`crate::errors::Error::EnvVar`] if the variable is set but not valid unicode.
pub fn env_or_default(name: &str, default: &str) -> Result<String> {
    resolve_env_value(std::env::var(name), default)
}

fn resolve_env_value(value: std::result::Result<String, VarError>, default: &str) -> Result<String> {
    match value {
        Ok(value) => Ok(value),
        Err(VarError::NotPresent) => Ok(default.to_string()),
        Err(e) => Err(e.into()),
    }
}

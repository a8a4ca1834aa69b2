//! Configuration error types

use thiserror::Error;

use crate::error::AppError;

/// Errors raised while loading, merging or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A loaded value is out of range or inconsistent with another
    #[error("Validation error: {field} - {message}")]
    ValidationError { field: String, message: String },

    #[error("Environment variable error: {0}")]
    EnvVarError(String),

    /// `PGHUB_CONFIG_DIR` and `PGHUB_CONFIG_FILE` were both given
    #[error("Mutual exclusivity error: {0}")]
    MutualExclusivityError(String),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The settings key the error refers to, when there is one.
    pub fn key(&self) -> &str {
        match self {
            ConfigError::ValidationError { field, .. } => field,
            ConfigError::EnvVarError(_) => "environment",
            _ => "config",
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::Configuration {
            key: error.key().to_string(),
            source: anyhow::Error::from(error),
        }
    }
}

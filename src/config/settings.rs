//! Settings structures loaded from TOML files and `PGHUB_*` variables.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

fn default_app_name() -> String {
    "pghub".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/pghub.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024
}

fn default_max_files() -> usize {
    5
}

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Which store the repositories run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local tables for development and tests; nothing is persisted
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

/// Deployment stage; selects the `config/{environment}.toml` layer.
///
/// Also accepted by `--env`, with the short aliases `dev`, `stage`, `prod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    Test,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl Environment {
    pub const ENV_VAR: &'static str = "PGHUB_APP_ENV";

    /// Reads `PGHUB_APP_ENV`, ignoring case. Unset means development; an
    /// unrecognised value is an error rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(Self::ENV_VAR) {
            Ok(raw) => <Self as ValueEnum>::from_str(raw.trim(), true).map_err(|_| {
                ConfigError::EnvVarError(format!(
                    "{}='{}' is not one of: development, test, staging, production",
                    Self::ENV_VAR,
                    raw
                ))
            }),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Name of this environment's layer inside the config directory.
    pub fn config_file_name(self) -> String {
        format!("{self}.toml")
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}

/// Store connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Connection URL, required for the postgres backend
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Pool acquisition timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Run pending migrations before serving
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// "full", "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Bytes written before the file is rolled over
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Rolled-over files kept on disk
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
            max_size: default_max_size(),
            max_files: default_max_files(),
        }
    }
}

/// Logger section of the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// "trace", "debug", "info", "warn" or "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime `LoggerConfig`.
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file = self.file.into_file_config()?;

        LoggerConfig::new(console, file, self.level).map_err(|e| ConfigError::ValidationError {
            field: "logger".to_string(),
            message: format!("{:#}", e),
        })
    }
}

impl FileSettings {
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })?;

        Ok(FileConfig {
            enabled: self.enabled,
            path: PathBuf::from(self.path),
            append: self.append,
            format,
            max_size: self.max_size,
            max_files: self.max_files,
        })
    }
}

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logger: LoggerSettings,
}

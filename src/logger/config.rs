//! Runtime configuration for the logger.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Main logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub console: ConsoleConfig,
    pub file: FileConfig,
    pub level: String,
}

impl LoggerConfig {
    /// Create a new logger configuration with validation
    pub fn new(console: ConsoleConfig, file: FileConfig, level: String) -> Result<Self> {
        let config = Self {
            console,
            file,
            level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        parse_level(&self.level).with_context(|| format!("Invalid log level: {}", self.level))?;

        self.file.validate().context("Invalid file configuration")?;

        if !self.console.enabled && !self.file.enabled {
            anyhow::bail!("At least one output (console or file) must be enabled");
        }

        Ok(())
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
            level: "info".to_string(),
        }
    }
}

/// Parse a log level name into a `tracing::Level`.
pub fn parse_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "Invalid log level '{}'. Valid levels are: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Console output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub colored: bool,
}

impl ConsoleConfig {
    pub fn new(enabled: bool, colored: bool) -> Self {
        Self { enabled, colored }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// File output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub append: bool,
    pub format: LogFormat,
    /// Size in bytes at which the active file is rolled over
    pub max_size: u64,
    /// Number of rolled-over files kept next to the active one
    pub max_files: usize,
}

impl FileConfig {
    /// Validate file configuration.
    ///
    /// Pure check; the directory is created by the writer.
    pub fn validate(&self) -> Result<()> {
        if self.enabled {
            if self.path.as_os_str().is_empty() {
                anyhow::bail!("File path cannot be empty when file output is enabled");
            }
            if self.max_size == 0 {
                anyhow::bail!("Maximum file size must be greater than 0");
            }
            if self.max_files == 0 {
                anyhow::bail!("Maximum number of files must be greater than 0");
            }
        }
        Ok(())
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs/pghub.log"),
            append: true,
            format: LogFormat::Json,
            max_size: 10 * 1024 * 1024,
            max_files: 5,
        }
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(LogFormat::Full),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!(
                "Invalid log format '{}'. Valid formats are: full, compact, json",
                s
            ),
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Full => "full",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LoggerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.console.enabled);
        assert!(!config.file.enabled);
    }

    #[test]
    fn test_no_outputs_fails() {
        let config = LoggerConfig {
            console: ConsoleConfig::new(false, false),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_file_requires_path_and_limits() {
        let mut file = FileConfig {
            enabled: true,
            path: PathBuf::new(),
            ..Default::default()
        };
        assert!(file.validate().is_err());

        file.path = PathBuf::from("logs/x.log");
        file.max_size = 0;
        assert!(file.validate().is_err());

        file.max_size = 1024;
        file.max_files = 0;
        assert!(file.validate().is_err());

        file.max_files = 2;
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::default(), LogFormat::Full);
    }

    proptest! {
        #[test]
        fn property_known_levels_parse(
            level in prop_oneof![
                Just("trace"), Just("DEBUG"), Just("Info"), Just("warn"), Just("ERROR")
            ]
        ) {
            prop_assert!(parse_level(level).is_ok());
        }

        #[test]
        fn property_unknown_levels_fail(level in "[a-z]{6,12}") {
            prop_assume!(!["trace", "debug", "info", "warn", "error"].contains(&level.as_str()));
            prop_assert!(parse_level(&level).is_err());
        }
    }
}

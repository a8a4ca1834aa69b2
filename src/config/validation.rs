//! Range and consistency checks applied after every load or merge.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, FileSettings, LoggerSettings, ServerConfig, Settings, StorageBackend,
};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// Port must be non-zero and the request timeout positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Pool bounds are checked for every backend; the URL only for postgres.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StorageBackend::Postgres {
            if self.url.trim().is_empty() {
                return Err(ConfigError::validation(
                    "database.url",
                    "Database URL is required for the postgres backend.",
                ));
            }

            if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
                return Err(ConfigError::validation(
                    "database.url",
                    "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
                ));
            }
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "database.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        if self.enabled && (self.max_size == 0 || self.max_files == 0) {
            return Err(ConfigError::validation(
                "logger.file",
                "max_size and max_files must be greater than 0 when file logging is enabled.",
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl Settings {
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    fn postgres(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_server_config_port_and_timeout() {
        assert!(ServerConfig::default().validate().is_ok());

        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "server.port");

        let config = ServerConfig {
            request_timeout: 0,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "server.request_timeout");
    }

    #[test]
    fn test_postgres_backend_requires_url() {
        let err = DatabaseConfig::default().validate().unwrap_err();
        assert_eq!(field_of(err), "database.url");

        let err = postgres("mysql://localhost/db").validate().unwrap_err();
        assert_eq!(field_of(err), "database.url");

        assert!(postgres("postgresql://u:p@db:5432/pghub").validate().is_ok());
    }

    #[test]
    fn test_memory_backend_ignores_url() {
        let config = DatabaseConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_bounds() {
        let config = DatabaseConfig {
            min_connections: 20,
            max_connections: 5,
            ..postgres("postgres://localhost/test")
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "database.min_connections");

        let config = DatabaseConfig {
            max_connections: 0,
            min_connections: 0,
            ..postgres("postgres://localhost/test")
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "database.max_connections");

        let config = DatabaseConfig {
            connection_timeout: 0,
            ..postgres("postgres://localhost/test")
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "database.connection_timeout");
    }

    #[test]
    fn test_logger_level_and_format() {
        let settings = LoggerSettings {
            level: "verbose".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.level");

        let mut settings = LoggerSettings {
            level: "WARN".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());

        settings.file.format = "yaml".to_string();
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.file.format");
    }

    #[test]
    fn test_logger_requires_an_output() {
        let mut settings = LoggerSettings::default();
        settings.console.enabled = false;
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger");

        settings.file.enabled = true;
        assert!(settings.validate().is_ok());

        settings.file.path = "  ".to_string();
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.file.path");
    }

    #[test]
    fn test_settings_validate_reports_first_error() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        settings.logger.level = "nope".to_string();
        assert_eq!(field_of(settings.validate().unwrap_err()), "server.port");
    }
}

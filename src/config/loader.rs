//! Layered settings loader.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::settings::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "PGHUB_CONFIG_DIR";

const CONFIG_FILE_ENV: &str = "PGHUB_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

const ENV_PREFIX: &str = "PGHUB";

/// Separator for nested keys: `PGHUB_DATABASE__URL` -> `database.url`
const ENV_SEPARATOR: &str = "__";

/// Loads `Settings` from, lowest priority first:
/// 1. `default.toml` (required)
/// 2. `{environment}.toml`
/// 3. `local.toml`
/// 4. `PGHUB_*` environment variables
///
/// When a single config file is selected the three file layers collapse into
/// that one file; environment variables still apply on top.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from `PGHUB_CONFIG_DIR`, `PGHUB_CONFIG_FILE` and
    /// `PGHUB_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Fails if both `PGHUB_CONFIG_DIR` and `PGHUB_CONFIG_FILE` are set.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_dir.is_some() && config_file.is_some() {
            return Err(ConfigError::MutualExclusivityError(
                "PGHUB_CONFIG_DIR and PGHUB_CONFIG_FILE cannot both be set. \
                 Use PGHUB_CONFIG_DIR for layered configuration or \
                 PGHUB_CONFIG_FILE for a single configuration file."
                    .to_string(),
            ));
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env()?,
        })
    }

    /// Load from a single file instead of the layered directory.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Load, deserialize and validate the settings.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match self.config_file {
            Some(ref config_file) => add_file_source(builder, config_file, true)?,
            None => {
                let builder = add_file_source(builder, &self.config_dir.join("default.toml"), true)?;
                let env_path = self.config_dir.join(self.environment.config_file_name());
                let builder = add_file_source(builder, &env_path, false)?;
                add_file_source(builder, &self.config_dir.join("local.toml"), false)?
            }
        };

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()
            .map_err(ConfigError::from)
    }
}

fn add_file_source(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if required && !path.is_file() {
        return Err(ConfigError::FileNotFound(format!(
            "Required configuration file not found: {}",
            path.display()
        )));
    }

    Ok(builder.add_source(
        File::new(&path.to_string_lossy(), FileFormat::Toml).required(required),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::StorageBackend;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Loader tests touch process-wide environment variables
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    const DEFAULT_TOML: &str = r#"
[application]
name = "pghub-test"
version = "1.0.0"

[server]
host = "127.0.0.1"
port = 3000
request_timeout = 30

[database]
backend = "postgres"
url = "postgres://localhost/pghub"
max_connections = 10
min_connections = 1
connection_timeout = 30

[logger]
level = "info"
"#;

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Restores touched environment variables on drop
    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let mut guard = Self {
                vars_to_restore: Vec::new(),
            };
            for key in [CONFIG_DIR_ENV, CONFIG_FILE_ENV, AppEnvironment::ENV_VAR] {
                guard.remove(key);
            }
            guard
        }

        fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_new_uses_defaults() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.config_dir, PathBuf::from("config"));
        assert!(loader.config_file.is_none());
        assert_eq!(loader.environment(), AppEnvironment::Development);
    }

    #[test]
    fn test_new_reads_environment_variables() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.set(CONFIG_DIR_ENV, "/custom/config");
        env.set(AppEnvironment::ENV_VAR, "production");

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.config_dir, PathBuf::from("/custom/config"));
        assert_eq!(loader.environment(), AppEnvironment::Production);
    }

    #[test]
    fn test_unknown_environment_is_rejected() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.set(AppEnvironment::ENV_VAR, "qa");

        match ConfigLoader::new() {
            Err(ConfigError::EnvVarError(msg)) => assert!(msg.contains("PGHUB_APP_ENV='qa'")),
            other => panic!("Expected EnvVarError, got {:?}", other.map(|l| l.environment())),
        }
    }

    #[test]
    fn test_dir_and_file_are_mutually_exclusive() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.set(CONFIG_DIR_ENV, "/custom/config");
        env.set(CONFIG_FILE_ENV, "/path/to/config.toml");

        match ConfigLoader::new() {
            Err(ConfigError::MutualExclusivityError(msg)) => {
                assert!(msg.contains("PGHUB_CONFIG_DIR"));
                assert!(msg.contains("PGHUB_CONFIG_FILE"));
            }
            other => panic!("Expected MutualExclusivityError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_default_toml() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);

        let result = ConfigLoader::new().unwrap().with_config_dir(temp_dir.path()).load();
        match result {
            Err(ConfigError::FileNotFound(msg)) => assert!(msg.contains("default.toml")),
            other => panic!("Expected FileNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_layers_apply_in_order() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();

        let production = r#"
[server]
host = "0.0.0.0"
port = 8080

[database]
max_connections = 50
"#;
        let local = r#"
[server]
port = 9090
"#;
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            ("production.toml", production),
            ("local.toml", local),
        ]);

        let settings = ConfigLoader::new()
            .unwrap()
            .with_config_dir(temp_dir.path())
            .with_environment(AppEnvironment::Production)
            .load()
            .expect("Should load settings");

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.database.max_connections, 50);
        assert_eq!(settings.database.min_connections, 1);
        assert_eq!(settings.application.name, "pghub-test");
    }

    #[test]
    fn test_environment_variables_override_files() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.set("PGHUB_SERVER__PORT", "4321");
        env.set("PGHUB_DATABASE__BACKEND", "memory");
        env.set("PGHUB_LOGGER__LEVEL", "debug");
        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_TOML)]);

        let settings = ConfigLoader::new()
            .unwrap()
            .with_config_dir(temp_dir.path())
            .load()
            .expect("Should load settings");

        assert_eq!(settings.server.port, 4321);
        assert_eq!(settings.database.backend, StorageBackend::Memory);
        assert_eq!(settings.logger.level, "debug");
    }

    #[test]
    fn test_single_file_mode_skips_layers() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            ("custom.toml", "[server]\nport = 7000\n\n[database]\nbackend = \"memory\"\n"),
        ]);

        let settings = ConfigLoader::new()
            .unwrap()
            .with_config_dir(temp_dir.path())
            .with_config_file(temp_dir.path().join("custom.toml"))
            .load()
            .expect("Should load settings");

        assert_eq!(settings.server.port, 7000);
        assert_eq!(settings.database.backend, StorageBackend::Memory);
        assert_eq!(settings.application.name, "pghub");
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            ("test.toml", "[database]\nmin_connections = 99\n"),
        ]);

        let result = ConfigLoader::new()
            .unwrap()
            .with_config_dir(temp_dir.path())
            .with_environment(AppEnvironment::Test)
            .load();

        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { ref field, .. }) if field == "database.min_connections"
        ));
    }

    #[test]
    fn test_shipped_configuration_is_valid() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config");

        let settings = ConfigLoader::new()
            .unwrap()
            .with_config_dir(&dir)
            .with_environment(AppEnvironment::Test)
            .load()
            .expect("Shipped config should load");

        assert_eq!(settings.database.backend, StorageBackend::Memory);
        assert_eq!(settings.logger.level, "debug");
    }
}

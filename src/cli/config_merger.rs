//! Merges CLI overrides into the file/env configuration.
//!
//! Precedence, lowest first: config files, `PGHUB_*` variables, global
//! flags (`--verbose`/`--quiet`), sub-command flags.

use super::parser::{Cli, Commands};
use crate::config::{ConfigError, ConfigLoader, Environment, Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
    environment: Environment,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings, environment: Environment) -> Self {
        Self {
            base_config,
            environment,
        }
    }

    /// Loads the base configuration, honouring `--config` and `--env`.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(env) = cli.env {
            loader = loader.with_environment(env);
        }
        if let Some(path) = &cli.config {
            loader = loader.with_config_file(path);
        }

        let environment = loader.environment();
        Ok(Self::new(loader.load()?, environment))
    }

    /// Applies the CLI overrides and validates the result.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(Commands::Serve {
            host,
            port,
            log_level,
            ..
        }) = &cli.command
        {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(level) = log_level {
                config.logger.level = level.as_str().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

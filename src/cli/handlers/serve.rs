//! Serve command handler.

use crate::config::{Environment, Settings, StorageBackend};
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
    environment: Environment,
}

impl ServeCommandHandler {
    pub fn new(config: Settings, environment: Environment) -> Self {
        Self {
            config,
            environment,
        }
    }

    /// Starts the server, or with `dry_run` only reports what it would do.
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            self.validate_only()
        } else {
            Server::new(self.config, self.environment).run().await
        }
    }

    /// Validates the configuration and prints a summary.
    pub fn validate_only(&self) -> anyhow::Result<()> {
        self.config.validate()?;

        println!("✓ Configuration is valid ({})", self.environment);
        println!("✓ Server would bind to: {}", self.config.server.address());
        match self.config.database.backend {
            StorageBackend::Postgres => println!(
                "✓ Storage backend: postgres (pool {}..{}, auto_migrate={})",
                self.config.database.min_connections,
                self.config.database.max_connections,
                self.config.database.auto_migrate
            ),
            StorageBackend::Memory => println!("✓ Storage backend: memory"),
        }
        println!("✓ Logger level: {}", self.config.logger.level);
        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

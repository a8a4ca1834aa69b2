//! Migrate command handler.

use crate::config::{ConfigError, Settings, StorageBackend};
use crate::db::{pending_migrations, revert_migrations, run_pending_migrations};
use crate::error::AppResult;

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Applies pending migrations, lists them (`dry_run`) or reverts the
    /// last `rollback` ones.
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        if self.config.database.backend != StorageBackend::Postgres {
            return Err(ConfigError::validation(
                "database.backend",
                "migrations require the postgres backend",
            )
            .into());
        }
        self.config.database.validate()?;
        let url = &self.config.database.url;

        if dry_run {
            println!("Checking for pending migrations...");
            let pending = pending_migrations(url).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations - database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                print_names(&pending);
                println!("\nRun without --dry-run to apply them");
            }
            return Ok(());
        }

        if let Some(steps) = rollback {
            println!("Reverting the last {steps} migration(s)...");
            let reverted = revert_migrations(url, steps as usize).await?;
            println!("✓ Reverted {} migration(s):", reverted.len());
            print_names(&reverted);
        } else {
            println!("Running database migrations...");
            let applied = run_pending_migrations(url).await?;
            if applied.is_empty() {
                println!("✓ No migrations to apply - database is already up to date");
            } else {
                println!("✓ Applied {} migration(s):", applied.len());
                print_names(&applied);
            }
        }

        Ok(())
    }
}

fn print_names(names: &[String]) {
    for name in names {
        println!("  - {name}");
    }
}

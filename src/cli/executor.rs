//! Dispatches a parsed command to its handler.

use super::handlers::{MigrateCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::{Environment, Settings};

/// Runs the selected sub-command; no sub-command means `serve`.
pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    environment: Environment,
) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings, environment)
                .execute(*dry_run)
                .await
        }
        None => ServeCommandHandler::new(settings, environment).execute(false).await,
        Some(Commands::Migrate { dry_run, rollback }) => {
            MigrateCommandHandler::new(settings)
                .execute(*dry_run, *rollback)
                .await?;
            Ok(())
        }
    }
}

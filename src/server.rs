//! HTTP server lifecycle: store setup, binding and graceful shutdown.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::{Environment, Settings, StorageBackend};
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::repositories::MemoryStore;
use crate::state::AppState;

pub struct Server {
    settings: Settings,
    environment: Environment,
}

impl Server {
    pub fn new(settings: Settings, environment: Environment) -> Self {
        Self {
            settings,
            environment,
        }
    }

    /// Builds the application state for the configured storage backend,
    /// applying pending migrations first when `database.auto_migrate` is set.
    pub async fn build_state(&self) -> anyhow::Result<AppState> {
        let database = &self.settings.database;
        match database.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on shutdown");
                Ok(AppState::memory(Arc::new(MemoryStore::new())))
            }
            StorageBackend::Postgres => {
                if database.auto_migrate {
                    let applied = run_pending_migrations(&database.url).await?;
                    tracing::info!(count = applied.len(), "Applied pending migrations");
                }

                tracing::info!("Initializing database connection pool...");
                let pool = establish_async_connection_pool(database).await?;
                tracing::info!("Database connection pool initialized");
                Ok(AppState::postgres(pool))
            }
        }
    }

    /// Serves requests until Ctrl+C or SIGTERM.
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %self.environment,
            "Application starting"
        );
        tracing::info!(
            host = %self.settings.server.host,
            port = self.settings.server.port,
            request_timeout = self.settings.server.request_timeout,
            "Server configuration loaded"
        );
        tracing::info!(
            backend = self.settings.database.backend.as_str(),
            max_connections = self.settings.database.max_connections,
            min_connections = self.settings.database.min_connections,
            connection_timeout = self.settings.database.connection_timeout,
            "Database configuration loaded"
        );

        let state = self.build_state().await?;
        let router = create_router(state, &self.settings.server);

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed is
/// logged and treated as never firing.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

//! Application state for Axum web framework.

use std::sync::Arc;

use crate::db::AsyncDbPool;
use crate::repositories::{MemoryStore, Repositories};
use crate::services::Services;

/// Shared services and resources, cloned into every handler.
///
/// Cloning is cheap; services and the pool are `Arc`-backed.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Present when the postgres backend is active; health checks use it
    pub db_pool: Option<AsyncDbPool>,
}

impl AppState {
    /// State backed by PostgreSQL through the given pool.
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self {
            services: Services::new(Repositories::postgres(pool.clone())),
            db_pool: Some(pool),
        }
    }

    /// State backed by an in-process store.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            services: Services::new(Repositories::memory(store)),
            db_pool: None,
        }
    }
}

//! Async connection pool: bb8 over diesel-async `AsyncPgConnection`.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// bb8::Pool is an `Arc` internally, so clones share one pool.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Builds the pool sized and timed from `config`.
///
/// # Errors
///
/// `AppError::ConnectionPool` if the initial `min_connections` cannot be
/// established.
///
/// # Example
///
/// ```ignore
/// let pool = establish_async_connection_pool(&settings.database).await?;
/// let mut conn = pool.get().await?;
/// ```
pub async fn establish_async_connection_pool(config: &DatabaseConfig) -> AppResult<AsyncDbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str());

    Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool {
            source: anyhow::Error::from(e),
        })
}

//! Repository layer: the only code that touches the store.
//!
//! `UserRepository` and `PostRepository` are implemented twice, over
//! PostgreSQL (diesel-async) and over the in-process `MemoryStore`.

mod memory;
mod post_repo;
mod user_repo;

pub use memory::MemoryStore;
pub use post_repo::PgPostRepository;
pub use user_repo::PgUserRepository;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::models::{Post, UpdatePost, UpdateUser, User};

/// Offset/limit window over a primary-key ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based; anything below 1 reads as the first page
    pub page_number: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page_number.max(1) - 1).saturating_mul(self.limit())
    }

    /// Negative sizes read as an empty page.
    pub fn limit(&self) -> i64 {
        self.page_size.max(0)
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Users ordered by id; every row when `page` is `None`.
    async fn get_all(&self, page: Option<PageRequest>) -> AppResult<Vec<User>>;

    async fn create(&self, user: User) -> AppResult<User>;

    /// `None` when no user has this id.
    async fn update(&self, id: Uuid, changes: UpdateUser) -> AppResult<Option<User>>;

    /// `false` when no user has this id.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// Posts are loaded and stored together with their attachments.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Post>>;

    /// Posts ordered by id; every row when `page` is `None`.
    async fn get_all(&self, page: Option<PageRequest>) -> AppResult<Vec<Post>>;

    async fn create(&self, post: Post) -> AppResult<Post>;

    /// Overwrites the mutable fields and replaces the attachment set
    /// wholesale. `None` when no post has this id.
    async fn update(&self, id: Uuid, changes: UpdatePost) -> AppResult<Option<Post>>;

    /// Removes the post and its attachments. `false` when no post has this id.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// Aggregates the repositories behind their traits.
///
/// Cloning is cheap; both fields are `Arc`s.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
}

impl Repositories {
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            posts: store,
        }
    }
}

/// PostgreSQL fixture for the diesel repository tests.
///
/// Those tests return early when `PGHUB_TEST_DATABASE_URL` is unset.
#[cfg(test)]
pub(crate) mod testing {
    use tokio::sync::OnceCell;

    use crate::config::DatabaseConfig;
    use crate::db::{AsyncDbPool, establish_async_connection_pool, run_pending_migrations};

    pub const TEST_DATABASE_URL: &str = "PGHUB_TEST_DATABASE_URL";

    static MIGRATED: OnceCell<()> = OnceCell::const_new();

    pub async fn pool() -> Option<AsyncDbPool> {
        let url = std::env::var(TEST_DATABASE_URL).ok()?;
        MIGRATED
            .get_or_init(|| async {
                run_pending_migrations(&url)
                    .await
                    .expect("migrations apply to the test database");
            })
            .await;

        let config = DatabaseConfig {
            url,
            max_connections: 2,
            min_connections: 0,
            ..DatabaseConfig::default()
        };
        Some(
            establish_async_connection_pool(&config)
                .await
                .expect("test database is reachable"),
        )
    }
}

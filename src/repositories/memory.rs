//! In-process store backing both repository traits.
//!
//! Meant for local runs and the test-suite, not for production data: writes
//! are serialised behind one lock and each one stages a full copy of the
//! tables. The copy replaces the live tables only when the whole operation
//! succeeds, mirroring a store transaction's commit or rollback.

use std::collections::BTreeMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Post, UpdatePost, UpdateUser, User};
use crate::repositories::{PageRequest, PostRepository, UserRepository};

#[derive(Debug, Default, Clone)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    posts: BTreeMap<Uuid, Post>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    fail_next_commit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next write fail at commit time, leaving the tables as they
    /// were before it started.
    #[cfg(test)]
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn commit_refused(&self) -> bool {
        self.fail_next_commit.swap(false, Ordering::SeqCst)
    }

    #[cfg(not(test))]
    fn commit_refused(&self) -> bool {
        false
    }

    async fn write<T, F>(&self, operation: &str, apply: F) -> AppResult<T>
    where
        F: FnOnce(&mut Tables) -> AppResult<T>,
    {
        let mut live = self.tables.write().await;
        let mut staged = live.clone();

        let result = apply(&mut staged).map_err(|e| match e {
            AppError::Database { .. } => e,
            other => AppError::database(operation, anyhow::Error::new(other)),
        })?;

        if self.commit_refused() {
            return Err(AppError::database(
                operation,
                anyhow::anyhow!("commit failed; transaction rolled back"),
            ));
        }

        *live = staged;
        Ok(result)
    }
}

fn page_of<T: Clone>(rows: &BTreeMap<Uuid, T>, page: Option<PageRequest>) -> Vec<T> {
    let rows = rows.values().cloned();
    match page {
        None => rows.collect(),
        Some(page) => rows
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(0))
            .collect(),
    }
}

fn duplicate_key(table: &str, id: Uuid) -> AppError {
    AppError::database(
        &format!("insert into {}", table),
        anyhow::anyhow!("Unique constraint violation ({}_pkey): key (id)=({}) already exists", table, id),
    )
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_all(&self, page: Option<PageRequest>) -> AppResult<Vec<User>> {
        Ok(page_of(&self.tables.read().await.users, page))
    }

    async fn create(&self, user: User) -> AppResult<User> {
        self.write("create user", |tables| {
            if tables.users.contains_key(&user.id) {
                return Err(duplicate_key("users", user.id));
            }
            tables.users.insert(user.id, user.clone());
            Ok(user)
        })
        .await
    }

    async fn update(&self, id: Uuid, changes: UpdateUser) -> AppResult<Option<User>> {
        self.write("update user", |tables| {
            Ok(tables.users.get_mut(&id).map(|user| {
                changes.apply_to(user);
                user.clone()
            }))
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        self.write("delete user", |tables| Ok(tables.users.remove(&id).is_some()))
            .await
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn get_all(&self, page: Option<PageRequest>) -> AppResult<Vec<Post>> {
        Ok(page_of(&self.tables.read().await.posts, page))
    }

    async fn create(&self, post: Post) -> AppResult<Post> {
        self.write("create post", |tables| {
            if tables.posts.contains_key(&post.id) {
                return Err(duplicate_key("posts", post.id));
            }
            let mut post = post;
            crate::models::sort_attachments(&mut post.attachments);
            tables.posts.insert(post.id, post.clone());
            Ok(post)
        })
        .await
    }

    async fn update(&self, id: Uuid, changes: UpdatePost) -> AppResult<Option<Post>> {
        self.write("update post", |tables| {
            Ok(tables.posts.get_mut(&id).map(|post| {
                post.apply(changes);
                post.clone()
            }))
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        self.write("delete post", |tables| Ok(tables.posts.remove(&id).is_some()))
            .await
    }
}

//! User service: DTO conversion, read-after-write and operation logging
//! over a [`UserRepository`].

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::dto::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::error::{AppError, AppResult};
use crate::repositories::UserRepository;

const ENTITY: &str = "User";

/// Cloning is cheap; the repository sits behind an `Arc`.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Returns `None` when no user has this id.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<UserResponse>> {
        info!(user_id = %id, "Fetching user");
        let user = self
            .repo
            .get_by_id(id)
            .await
            .inspect_err(|e| error!(user_id = %id, error = %e, "Failed to fetch user"))?;

        match user {
            Some(user) => {
                info!(user_id = %id, "User fetched");
                Ok(Some(user.into()))
            }
            None => {
                warn!(user_id = %id, "User not found");
                Ok(None)
            }
        }
    }

    /// Every user, ordered by id.
    pub async fn get_all(&self) -> AppResult<Vec<UserResponse>> {
        info!("Fetching all users");
        let users = self
            .repo
            .get_all(None)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to fetch users"))?;

        info!(count = users.len(), "Users fetched");
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Stores a new user under a fresh id and returns it as re-read from the store.
    pub async fn create(&self, request: CreateUserRequest) -> AppResult<UserResponse> {
        let id = Uuid::new_v4();
        info!(user_id = %id, "Creating user");

        self.repo
            .create(request.into_user(id))
            .await
            .inspect_err(|e| error!(user_id = %id, error = %e, "Failed to create user"))?;

        let created = self.reload(id).await?;
        info!(user_id = %id, "User created");
        Ok(created)
    }

    /// Replaces the user's fields. Returns `None` when no user has this id.
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> AppResult<Option<UserResponse>> {
        info!(user_id = %id, "Updating user");
        let updated = self
            .repo
            .update(id, request.into())
            .await
            .inspect_err(|e| error!(user_id = %id, error = %e, "Failed to update user"))?;

        if updated.is_none() {
            warn!(user_id = %id, "User not found for update");
            return Ok(None);
        }

        let user = self.reload(id).await?;
        info!(user_id = %id, "User updated");
        Ok(Some(user))
    }

    /// `false` when no user has this id. The user's posts are left in place.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        info!(user_id = %id, "Deleting user");
        let deleted = self
            .repo
            .delete(id)
            .await
            .inspect_err(|e| error!(user_id = %id, error = %e, "Failed to delete user"))?;

        if deleted {
            info!(user_id = %id, "User deleted");
        } else {
            warn!(user_id = %id, "User not found for delete");
        }
        Ok(deleted)
    }

    async fn reload(&self, id: Uuid) -> AppResult<UserResponse> {
        match self.repo.get_by_id(id).await {
            Ok(Some(user)) => Ok(user.into()),
            Ok(None) => {
                error!(user_id = %id, "User missing after write");
                Err(AppError::not_found(ENTITY, id))
            }
            Err(e) => {
                error!(user_id = %id, error = %e, "Failed to re-read user");
                Err(e)
            }
        }
    }
}

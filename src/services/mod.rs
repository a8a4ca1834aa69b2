//! Service layer for business logic operations.
//!
//! Services convert between DTOs and entities, re-read rows after every
//! write and log each operation.

mod post_service;
mod user_service;

pub use post_service::PostService;
pub use user_service::UserService;

use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// Cloning is cheap; every service holds its repository behind an `Arc`.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub posts: PostService,
}

impl Services {
    pub fn new(repos: Repositories) -> Self {
        Self {
            users: UserService::new(repos.users),
            posts: PostService::new(repos.posts),
        }
    }
}

//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `user`, `post` - entity request/response DTOs
//! - `response`, `error` - success and error envelopes
//! - `pagination` - page query parameters
//! - `health` - health probe responses

mod error;
mod health;
mod pagination;
mod post;
mod response;
mod user;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use pagination::PageQuery;
pub use post::{
    AttachmentRequest, AttachmentResponse, CreatePostRequest, PostResponse, UpdatePostRequest,
};
pub use response::ApiResponse;
pub use user::{CreateUserRequest, UpdateUserRequest, UserResponse};

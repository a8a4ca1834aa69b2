//! User request and response DTOs.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{UpdateUser, User};
use crate::utils::validate::not_blank;

/// Requires a dotted domain part; the plain email check accepts `a@localhost`.
pub(crate) static EMAIL_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email domain pattern is valid")
});

/// Request body for creating a user.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Email is required."),
        email(message = "Invalid email format."),
        regex(path = *EMAIL_DOMAIN, message = "Email must have a valid domain (e.g., .com, .ro, etc.)."),
        length(max = 100, message = "Email must not exceed 100 characters.")
    )]
    #[schema(format = "email", max_length = 100, example = "ann@example.com")]
    pub email: String,

    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "First name is required."),
        length(min = 3, max = 100, message = "First name must be between 3 and 100 characters long.")
    )]
    #[schema(min_length = 3, max_length = 100, example = "Ann")]
    pub first_name: String,

    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Last name is required."),
        length(min = 3, max = 100, message = "Last name must be between 3 and 100 characters long.")
    )]
    #[schema(min_length = 3, max_length = 100, example = "Lee")]
    pub last_name: String,

    #[serde(default)]
    #[validate(length(max = 32, message = "Phone number must not exceed 32 characters."))]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub role_type: Option<i32>,
}

impl CreateUserRequest {
    pub fn into_user(self, id: Uuid) -> User {
        User {
            id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            role_type: self.role_type,
        }
    }
}

/// Request body for replacing a user's fields.
///
/// Optional fields left out are cleared.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Email is required."),
        email(message = "Invalid email format."),
        regex(path = *EMAIL_DOMAIN, message = "Email must have a valid domain (e.g., .com, .ro, etc.)."),
        length(max = 100, message = "Email must not exceed 100 characters.")
    )]
    #[schema(format = "email", max_length = 100)]
    pub email: String,

    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "First name is required."),
        length(min = 3, max = 100, message = "First name must be between 3 and 100 characters long.")
    )]
    #[schema(min_length = 3, max_length = 100)]
    pub first_name: String,

    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Last name is required."),
        length(min = 3, max = 100, message = "Last name must be between 3 and 100 characters long.")
    )]
    #[schema(min_length = 3, max_length = 100)]
    pub last_name: String,

    #[serde(default)]
    #[validate(length(max = 32, message = "Phone number must not exceed 32 characters."))]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub role_type: Option<i32>,
}

impl From<UpdateUserRequest> for UpdateUser {
    fn from(request: UpdateUserRequest) -> Self {
        Self {
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            phone_number: request.phone_number,
            role_type: request.role_type,
        }
    }
}

/// User as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role_type: Option<i32>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            role_type: user.role_type,
        }
    }
}

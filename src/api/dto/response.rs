//! Success envelope shared by the single-entity endpoints.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Envelope carrying a message, a success flag, the status code and the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub message: String,
    pub success: bool,
    #[schema(example = 200)]
    pub status_code: u16,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            success: status.is_success(),
            status_code: status.as_u16(),
            data: Some(data),
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, data)
    }
}

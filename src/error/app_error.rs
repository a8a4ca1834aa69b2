use crate::error::DatabaseErrorConverter;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Application-wide error type that represents all possible errors in the system.
///
/// Client-facing kinds (not found, validation, bad request) carry the details
/// shown in the response body. Server-side kinds keep their source for the
/// logs only.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// One or more field rules failed on an incoming payload
    #[error("Validation failed: {} field error(s)", errors.len())]
    Validation { errors: Vec<ValidationFieldError> },

    /// Malformed request: bad JSON, bad path parameter, bad query string
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Store operation failed; the surrounding transaction was rolled back
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// No connection could be acquired from the pool
    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

/// A single failed field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

impl ValidationFieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl AppError {
    pub fn not_found(entity: &str, value: impl ToString) -> Self {
        AppError::NotFound {
            entity: entity.to_string(),
            field: "id".to_string(),
            value: value.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
        }
    }

    pub fn database(operation: &str, source: impl Into<anyhow::Error>) -> Self {
        AppError::Database {
            operation: operation.to_string(),
            source: source.into(),
        }
    }

    /// Whether the fault lies with the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::NotFound { .. } | AppError::Validation { .. } | AppError::BadRequest { .. }
        )
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for AppError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::from(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

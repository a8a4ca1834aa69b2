//! Conversion of [`AppError`] into HTTP responses.
//!
//! `IntoResponse for AppError` is the single place where an error kind
//! becomes a status code and an [`ErrorResponse`] body. Server-side faults
//! get a generic message; their source only reaches the logs. A pool that
//! cannot hand out a connection is one of those faults: the client sees a
//! plain 500 and only the log line names the pool.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Caps how much of a non-JSON error body is read back when rewriting it.
const MAX_REWRITTEN_BODY: usize = 64 * 1024;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        let code = error_to_code(&self);

        if self.is_client_error() {
            tracing::warn!(status = status.as_u16(), code, error = %self, "Request failed");
        } else {
            tracing::error!(status = status.as_u16(), code, error = ?self, "Request failed");
        }

        let body = match self {
            AppError::NotFound {
                entity,
                field,
                value,
            } => ErrorResponse::not_found(&entity, &field, &value),
            AppError::Validation { errors } => {
                ErrorResponse::new(status, code, "One or more validation errors occurred.")
                    .with_errors(errors)
            }
            AppError::BadRequest { message } => ErrorResponse::new(status, code, &message),
            AppError::ConnectionPool { .. } => {
                ErrorResponse::new(status, "INTERNAL_ERROR", "An unexpected error occurred.")
            }
            AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
                ErrorResponse::new(status, code, "An unexpected error occurred.")
            }
        };

        (status, Json(body)).into_response()
    }
}

pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Database { .. }
        | AppError::ConnectionPool { .. }
        | AppError::Configuration { .. }
        | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Code written to the log line. Pool failures answer with `INTERNAL_ERROR`.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Validation { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::Database { .. } => "DATABASE_ERROR",
        AppError::ConnectionPool { .. } => "CONNECTION_POOL_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

/// Rewrites error responses that axum produced on its own (unknown route,
/// wrong method, unsupported media type, timeouts) into the JSON error
/// envelope. Responses that already carry JSON pass through untouched.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if is_json {
        return response;
    }

    let (_parts, body) = response.into_parts();
    let original = axum::body::to_bytes(body, MAX_REWRITTEN_BODY)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default();

    let (code, fallback) = match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Bad request."),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "The requested resource was not found."),
        StatusCode::METHOD_NOT_ALLOWED => (
            "METHOD_NOT_ALLOWED",
            "HTTP method not allowed for this endpoint.",
        ),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ("UNSUPPORTED_MEDIA_TYPE", "Unsupported media type."),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request payload too large."),
        StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "Request timeout."),
        StatusCode::SERVICE_UNAVAILABLE => {
            ("SERVICE_UNAVAILABLE", "Service temporarily unavailable.")
        }
        s if s.is_server_error() => ("INTERNAL_ERROR", "An unexpected error occurred."),
        _ => ("ERROR", "The request could not be processed."),
    };

    // Server-side bodies are never echoed back.
    let message = if original.is_empty() || status.is_server_error() {
        fallback.to_string()
    } else {
        original
    };

    tracing::warn!(status = status.as_u16(), code, "Rewrote plain error response");

    (status, Json(ErrorResponse::new(status, code, &message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationFieldError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::not_found("User", "1"), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Validation { errors: vec![] },
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (AppError::bad_request("bad"), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (
                AppError::database("create user", anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
            ),
            (
                AppError::ConnectionPool {
                    source: anyhow::anyhow!("timed out"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONNECTION_POOL_ERROR",
            ),
            (
                AppError::Configuration {
                    key: "database.url".to_string(),
                    source: anyhow::anyhow!("missing"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
            ),
            (
                AppError::Internal {
                    source: anyhow::anyhow!("unexpected"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (error, status, code) in cases {
            assert_eq!(error_to_status_code(&error), status, "{error}");
            assert_eq!(error_to_code(&error), code, "{error}");
        }
    }

    #[tokio::test]
    async fn test_validation_response_lists_field_errors() {
        let error = AppError::Validation {
            errors: vec![
                ValidationFieldError::new("email", "Invalid email format."),
                ValidationFieldError::new(
                    "firstName",
                    "First name must be between 3 and 100 characters long.",
                ),
            ],
        };

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["statusCode"], 400);
        assert_eq!(json["errors"].as_array().unwrap().len(), 2);
        assert_eq!(json["errors"][1]["field"], "firstName");
    }

    #[tokio::test]
    async fn test_server_error_does_not_leak_source() {
        let error = AppError::database(
            "update post",
            anyhow::anyhow!("password authentication failed for user \"admin\""),
        );

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["message"], "An unexpected error occurred.");
        assert!(!json.to_string().contains("admin"));
    }

    #[tokio::test]
    async fn test_pool_exhaustion_is_a_generic_server_error() {
        let error = AppError::ConnectionPool {
            source: anyhow::anyhow!("timed out waiting for connection to db.internal:5432"),
        };

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["statusCode"], 500);
        assert_eq!(json["message"], "An unexpected error occurred.");
        assert!(!json.to_string().contains("db.internal"));
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let response = AppError::not_found("Post", "abc").into_response();
        let json = body_json(response).await;

        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Post with id 'abc' was not found.");
    }
}

//! Error response DTOs.

use axum::http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ValidationFieldError;

/// Error envelope returned for every failed request.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    #[schema(example = "NOT_FOUND")]
    pub code: String,
    pub message: String,
    #[schema(example = 404)]
    pub status_code: u16,
    /// Failed field rules, present on validation errors only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationFieldError>>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            success: false,
            code: code.to_string(),
            message: message.to_string(),
            status_code: status.as_u16(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<ValidationFieldError>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn not_found(entity: &str, field: &str, value: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("{entity} with {field} '{value}' was not found."),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_omitted_when_absent() {
        let json = serde_json::to_value(ErrorResponse::not_found("User", "id", "42")).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["message"], "User with id '42' was not found.");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_with_errors() {
        let response = ErrorResponse::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Invalid")
            .with_errors(vec![ValidationFieldError::new("email", "Invalid email format.")]);
        let json = serde_json::to_value(response).unwrap();

        assert_eq!(json["errors"][0]["field"], "email");
        assert_eq!(json["errors"][0]["message"], "Invalid email format.");
    }
}

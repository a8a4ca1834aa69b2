//! Request extractors that validate their payloads, and the conversion of
//! `validator` reports into [`AppError::Validation`].

use crate::error::{AppError, AppResult, ValidationFieldError};
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// JSON body that has passed its `Validate` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string that has passed its `Validate` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

/// The `{id}` path segment of an entity route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(pub Uuid);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state).await?;
        Ok(EntityId(id))
    }
}

/// Rejects strings that are empty or whitespace only.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(report: ValidationErrors) -> Self {
        let mut errors = Vec::new();
        flatten(&report, "", &mut errors);
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation { errors }
    }
}

fn flatten(report: &ValidationErrors, prefix: &str, out: &mut Vec<ValidationFieldError>) {
    for (name, kind) in report.errors() {
        let field = format!("{prefix}{}", to_camel_case(name));
        match kind {
            ValidationErrorsKind::Field(failures) => {
                out.extend(failures.iter().map(|failure| {
                    let message = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string());
                    ValidationFieldError::new(field.clone(), message)
                }));
            }
            ValidationErrorsKind::Struct(inner) => {
                flatten(inner, &format!("{field}."), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(inner, &format!("{field}[{index}]."), out);
                }
            }
        }
    }
}

fn to_camel_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            result.extend(c.to_uppercase());
            upper = false;
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct Line {
        #[validate(custom(function = "not_blank", message = "Label is required."))]
        label: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct Order {
        #[validate(length(min = 3, message = "Customer name is too short."))]
        customer_name: String,
        #[validate(email(message = "Invalid email format."))]
        contact_email: String,
        #[serde(default)]
        #[validate(nested)]
        lines: Vec<Line>,
    }

    fn json_request(body: &str) -> Request {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri("/orders")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn validation_errors(error: AppError) -> Vec<ValidationFieldError> {
        match error {
            AppError::Validation { errors } => errors,
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("x").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank("  \t").is_err());
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("first_name"), "firstName");
        assert_eq!(to_camel_case("email"), "email");
        assert_eq!(to_camel_case("file_name_2"), "fileName2");
    }

    #[tokio::test]
    async fn test_valid_body() {
        let request = json_request(
            r#"{"customerName":"Ann","contactEmail":"ann@example.com","lines":[{"label":"a"}]}"#,
        );

        let ValidatedJson(order) = ValidatedJson::<Order>::from_request(request, &())
            .await
            .unwrap();

        assert_eq!(order.customer_name, "Ann");
        assert_eq!(order.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_every_failing_field_is_reported() {
        let request = json_request(r#"{"customerName":"Al","contactEmail":"bad"}"#);

        let error = ValidatedJson::<Order>::from_request(request, &())
            .await
            .unwrap_err();
        let errors = validation_errors(error);

        assert_eq!(
            errors,
            vec![
                ValidationFieldError::new("contactEmail", "Invalid email format."),
                ValidationFieldError::new("customerName", "Customer name is too short."),
            ]
        );
    }

    #[tokio::test]
    async fn test_nested_list_errors_are_indexed() {
        let request = json_request(
            r#"{"customerName":"Ann","contactEmail":"ann@example.com","lines":[{"label":"ok"},{"label":" "}]}"#,
        );

        let error = ValidatedJson::<Order>::from_request(request, &())
            .await
            .unwrap_err();
        let errors = validation_errors(error);

        assert_eq!(
            errors,
            vec![ValidationFieldError::new("lines[1].label", "Label is required.")]
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = json_request(r#"{"customerName":"#);

        let error = ValidatedJson::<Order>::from_request(request, &())
            .await
            .unwrap_err();

        assert!(matches!(error, AppError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/orders")
            .body(Body::from("{}"))
            .unwrap();

        let error = ValidatedJson::<Order>::from_request(request, &())
            .await
            .unwrap_err();

        assert!(matches!(error, AppError::BadRequest { .. }));
    }

    #[test]
    fn test_message_falls_back_to_code() {
        let mut report = ValidationErrors::new();
        report.add("role_type", ValidationError::new("range"));

        let errors = validation_errors(AppError::from(report));

        assert_eq!(errors, vec![ValidationFieldError::new("roleType", "range")]);
    }
}

use crate::error::AppError;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// Utility for converting store errors to `AppError` variants.
///
/// Every store failure surfaces as an unexpected fault. The constraint
/// details are kept in the error source so they reach the server log, never
/// the response body.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error raised while running `operation`.
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let label = match kind {
            DatabaseErrorKind::UniqueViolation => "Unique constraint violation",
            DatabaseErrorKind::ForeignKeyViolation => "Foreign key constraint violation",
            DatabaseErrorKind::NotNullViolation => "Not null constraint violation",
            DatabaseErrorKind::CheckViolation => "Check constraint violation",
            DatabaseErrorKind::SerializationFailure => "Serialization failure",
            DatabaseErrorKind::ClosedConnection => {
                return AppError::ConnectionPool {
                    source: anyhow::Error::msg(format!(
                        "Connection closed during {}: {}",
                        operation,
                        info.message()
                    )),
                };
            }
            _ => "Database error",
        };

        let detail = match info.constraint_name() {
            Some(constraint) => format!("{} ({}): {}", label, constraint, info.message()),
            None => format!("{}: {}", label, info.message()),
        };

        AppError::Database {
            operation: operation.to_string(),
            source: anyhow::Error::msg(detail),
        }
    }
}

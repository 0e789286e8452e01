//! Domain error types for the monitoring platform.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use std::collections::BTreeMap;
use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One or more fields failed validation
    #[error("Validation failed: {}", format_field_errors(.0))]
    Validation(FieldErrors),

    /// Optimistic-concurrency conflict: the record changed since it was read
    #[error("{entity} {id} was changed by someone else (expected version {expected})")]
    StaleVersion {
        entity: &'static str,
        id: i32,
        expected: i32,
    },

    /// Report publication attempted before QA approval
    #[error("Report for case {0} has not been approved by QA")]
    NotQaApproved(i32),

    /// User may not perform the action
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Acting user missing or unknown
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Blob store operation failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Validation error on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }
}

fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StaleVersion { .. } => StatusCode::CONFLICT,
            AppError::NotQaApproved(_) => StatusCode::CONFLICT,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Storage(err_str) => {
                tracing::error!("Storage error: {}", err_str);
                ("STORAGE_ERROR", self.to_string())
            }
            AppError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            AppError::InvalidInput(_) => ("INVALID_INPUT", self.to_string()),
            AppError::Validation(_) => ("VALIDATION_ERROR", self.to_string()),
            AppError::StaleVersion { .. } => (
                "STALE_VERSION",
                format!("{}. Reload the page and try again.", self),
            ),
            AppError::NotQaApproved(_) => ("NOT_QA_APPROVED", self.to_string()),
            AppError::PermissionDenied(_) => ("PERMISSION_DENIED", self.to_string()),
            AppError::Unauthorized(_) => ("UNAUTHORIZED", self.to_string()),
        };

        let fields = match self {
            AppError::Validation(errors) => Some(errors.clone()),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
            fields,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Per-field messages for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::InvalidInput(format!("CSV error: {}", err))
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        AppError::InvalidInput(format!("Template error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("Case 1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::StaleVersion {
                entity: "Case",
                id: 1,
                expected: 3
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::field("home_page_url", "Enter a URL").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::PermissionDenied("comment".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let err = AppError::field("previous_case_url", "Case not found");
        assert_eq!(
            err.to_string(),
            "Validation failed: previous_case_url: Case not found"
        );
    }
}

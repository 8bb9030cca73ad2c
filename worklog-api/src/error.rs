/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which automatically converts to
/// the right HTTP status code and a JSON error envelope
/// `{"error": code, "message": ..., "details": [...]}`.
///
/// # Taxonomy
///
/// - `Unauthorized` (401): no valid session
/// - `Forbidden` (403): valid session but role/ownership/state disallows the
///   action (wrong-state mutations surface here too)
/// - `NotFound` (404): referenced entity absent
/// - `DocumentMissing` (404): the entity exists but its document was evicted
///   from the ephemeral store; carries a user-actionable message
/// - `Conflict` (409): e.g., opening a second week
/// - `ValidationError` (422): malformed/missing input, with per-field details
/// - `InternalError` (500): dependency failures; logged, surfaced generically

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Stored document evicted from the ephemeral store (404, distinct code)
    DocumentMissing,

    /// Conflict (409) - e.g., a second open week
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "forbidden", "validation_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Shorthand for a single-field validation error
    pub fn invalid_field(field: &str, message: &str) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.to_string(),
        }])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DocumentMissing => write!(f, "Document missing from storage"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::DocumentMissing => (
                StatusCode::NOT_FOUND,
                "document_missing",
                "The requested document is no longer available; please contact support"
                    .to_string(),
                None,
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert request-DTO validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(errors)
    }
}

/// Convert authorization errors to API errors
impl From<worklog_shared::auth::authorization::AuthzError> for ApiError {
    fn from(err: worklog_shared::auth::authorization::AuthzError) -> Self {
        use worklog_shared::auth::authorization::AuthzError;

        match err {
            AuthzError::MissingCapability { .. } => {
                ApiError::Forbidden("Insufficient permissions".to_string())
            }
            AuthzError::NotOwner => {
                ApiError::Forbidden("Not authorized to access this resource".to_string())
            }
        }
    }
}

/// Convert JWT errors to API errors
impl From<worklog_shared::auth::jwt::JwtError> for ApiError {
    fn from(err: worklog_shared::auth::jwt::JwtError) -> Self {
        use worklog_shared::auth::jwt::JwtError;

        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert OAuth exchange errors to API errors
impl From<worklog_shared::auth::oauth::OauthError> for ApiError {
    fn from(err: worklog_shared::auth::oauth::OauthError) -> Self {
        use worklog_shared::auth::oauth::OauthError;

        match err {
            OauthError::ExchangeFailed(msg) => {
                ApiError::Unauthorized(format!("Sign-in failed: {}", msg))
            }
            OauthError::MissingEmail => {
                ApiError::Unauthorized("Provider account has no email address".to_string())
            }
            OauthError::ProfileFailed(msg) => ApiError::InternalError(msg),
            OauthError::Http(e) => ApiError::InternalError(format!("OAuth request failed: {}", e)),
        }
    }
}

/// Convert tracker errors to API errors
///
/// Dependency failures are logged at the boundary and surfaced generically.
impl From<worklog_shared::tracker::TrackerError> for ApiError {
    fn from(err: worklog_shared::tracker::TrackerError) -> Self {
        ApiError::InternalError(format!("Issue tracker request failed: {}", err))
    }
}

/// Convert storage errors to API errors
impl From<worklog_shared::storage::StorageError> for ApiError {
    fn from(err: worklog_shared::storage::StorageError) -> Self {
        use worklog_shared::storage::StorageError;

        match err {
            StorageError::InvalidName(name) => {
                ApiError::BadRequest(format!("Invalid document name: {}", name))
            }
            StorageError::Io(e) => ApiError::InternalError(format!("Storage I/O failed: {}", e)),
        }
    }
}

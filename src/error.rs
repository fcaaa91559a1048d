use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::token::TokenError;

/// Which uniqueness constraint a registration collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Username,
    Email,
}

impl std::fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateField::Username => write!(f, "username"),
            DuplicateField::Email => write!(f, "email"),
        }
    }
}

/// Failures produced by the auth service and the resource stores.
///
/// Every operation returns these as typed results; only the HTTP layer
/// turns them into responses. `InvalidCredentials` deliberately carries no
/// detail about whether the email or the password was wrong, and `NotFound`
/// covers both missing ids and other owners' ids.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} already registered")]
    Duplicate(DuplicateField),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthenticated,

    #[error("not found")]
    NotFound,

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Duplicate(field) => {
                ApiError::conflict(format!("{} already registered", field))
            }
            ServiceError::InvalidCredentials => {
                ApiError::unauthorized("invalid email or password")
            }
            ServiceError::Unauthenticated => ApiError::unauthorized("authentication required"),
            ServiceError::NotFound => ApiError::not_found("not found"),
            ServiceError::Token(e) => {
                tracing::error!("token signing error: {}", e);
                ApiError::InternalServerError("an error occurred while processing your request".into())
            }
            ServiceError::Hash(e) => {
                tracing::error!("password hashing error: {}", e);
                ApiError::InternalServerError("an error occurred while processing your request".into())
            }
            ServiceError::Database(e) => {
                // Log the real error but return a generic message
                tracing::error!("database error: {}", e);
                ApiError::InternalServerError("an error occurred while processing your request".into())
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

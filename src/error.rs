//! Domain error types for the Skyvidya eval server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.
//! The upstream variants mirror the failure modes the validator model API can
//! produce: invalid credentials, rate limiting, safety-filter rejection, and
//! unparseable output.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The validator API rejected our credentials (upstream 403)
    #[error("Validator credential rejected: {0}")]
    CredentialInvalid(String),

    /// The validator API rate-limited us (upstream 429)
    #[error("Validator rate limited: {0}")]
    RateLimited(String),

    /// The validator's safety filter blocked the content
    #[error("Content rejected by safety filter: {0}")]
    ContentBlocked(String),

    /// The validator returned output we could not parse into scores
    #[error("Validation output unparseable: {0}")]
    ValidationParse(String),

    /// Any other upstream (network/HTTP) failure
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::InvalidInput(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                self.to_string(),
            ),
            AppError::Unauthorized(_) => (
                actix_web::http::StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                self.to_string(),
            ),
            AppError::CredentialInvalid(_) => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                "UPSTREAM_CREDENTIAL",
                self.to_string(),
            ),
            AppError::RateLimited(_) => (
                actix_web::http::StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                self.to_string(),
            ),
            AppError::ContentBlocked(_) => (
                actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
                "CONTENT_BLOCKED",
                self.to_string(),
            ),
            AppError::ValidationParse(_) => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                "VALIDATION_PARSE",
                self.to_string(),
            ),
            AppError::Upstream(err_str) => {
                tracing::error!("Upstream error: {}", err_str);
                (
                    actix_web::http::StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    self.to_string(),
                )
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

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

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid UUID: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

//! Actix-web extractor for API key authentication.
//!
//! # Security
//! - All secret values (API keys, admin keys) are wrapped in `SecretString`
//! - Secret values are never logged or exposed in debug output
//! - Memory is zeroized when secrets are dropped
//! - Constant-time comparison for the admin key

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use futures_util::future::LocalBoxFuture;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use super::AdminKey;
use crate::config::{ADMIN_KEY_HEADER, API_KEY_HEADER};
use crate::db::DbPool;
use crate::error::{AppError, ErrorResponse};
use crate::models::{ApiKeyRole, AuthenticatedCaller};
use crate::services::api_key;

/// Extract a secret header value, wrapping it in SecretString.
/// Returns None if the header is missing or invalid UTF-8.
fn extract_secret_header(req: &HttpRequest, header_name: &str) -> Option<SecretString> {
    req.headers()
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(|s| SecretString::from(s.to_string()))
}

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    message: String,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED).json(ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: self.message.clone(),
        })
    }
}

/// Extractor that requires a valid API key.
///
/// Use this in handlers that require authentication:
/// ```ignore
/// async fn protected_handler(auth: ApiKeyAuth) -> impl Responder {
///     // auth.caller contains the authenticated caller info
/// }
/// ```
pub struct ApiKeyAuth {
    pub caller: AuthenticatedCaller,
}

impl ApiKeyAuth {
    /// The workspace this caller operates in. Instance-wide callers (the
    /// bootstrap admin key, unscoped keys) have none and are rejected from
    /// workspace-scoped endpoints.
    pub fn require_workspace(&self) -> Result<Uuid, AppError> {
        self.caller.workspace_id.ok_or_else(|| {
            AppError::InvalidInput(
                "This endpoint requires a workspace-scoped API key".to_string(),
            )
        })
    }
}

impl FromRequest for ApiKeyAuth {
    type Error = AuthError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Get DbPool from app data
        let pool = req.app_data::<web::Data<DbPool>>().cloned();

        // Get stored admin key from app data (optional)
        let stored_admin_key = req.app_data::<web::Data<AdminKey>>().cloned();

        // Extract secrets from headers - immediately wrapped in SecretString
        let provided_api_key: Option<SecretString> = extract_secret_header(req, API_KEY_HEADER);
        let provided_admin_key: Option<SecretString> = extract_secret_header(req, ADMIN_KEY_HEADER);

        Box::pin(async move {
            let Some(pool) = pool else {
                return Err(AuthError {
                    message: "Internal configuration error".to_string(),
                });
            };

            // Check admin key first (for bootstrap operations), using
            // constant-time comparison
            if let Some(ref provided) = provided_admin_key
                && let Some(ref key) = stored_admin_key
                && key.verify(provided.expose_secret())
            {
                // Admin key authenticated; provided_admin_key is dropped
                // below and its memory zeroized
                return Ok(ApiKeyAuth {
                    caller: AuthenticatedCaller {
                        key_id: "admin".to_string(),
                        workspace_id: None,
                        name: "Admin (Bootstrap)".to_string(),
                        key_prefix: "admin".to_string(),
                        role: ApiKeyRole::Admin,
                    },
                });
            }

            // Check API key from database
            match provided_api_key {
                Some(ref key) => {
                    match api_key::verify_key(pool.get_ref(), key.expose_secret()).await {
                        Ok(caller) => Ok(ApiKeyAuth { caller }),
                        Err(e) => Err(AuthError {
                            message: e.to_string(),
                        }),
                    }
                }
                None => Err(AuthError {
                    message: "Missing API key. Provide X-API-Key header.".to_string(),
                }),
            }
        })
    }
}

//! Domain-verification models.
//!
//! A workspace proves ownership of a DNS domain by publishing a TXT record
//! at `_skyvidya-verification.<domain>` containing its verification token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request to register a domain for verification.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterDomainRequest {
    /// Bare domain name, e.g. "example.com".
    pub domain: String,
}

/// Domain row response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DomainResponse {
    pub id: Uuid,
    pub domain: String,
    /// Token the owner must publish in the TXT record.
    pub verification_token: String,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Result of a verification attempt.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyDomainResponse {
    pub success: bool,
    pub message: String,
}

//! Domain verification API handlers.

use actix_web::{HttpResponse, get, post, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::db::DbPool;
use crate::entity::domain;
use crate::error::{AppError, AppResult};
use crate::models::{DomainResponse, RegisterDomainRequest, VerifyDomainResponse};
use crate::services::DomainVerifier;
use crate::services::domain_verification::{generate_token, record_name};

use super::forbid_viewer;

fn to_response(model: domain::Model) -> DomainResponse {
    DomainResponse {
        id: model.id,
        domain: model.domain,
        verification_token: model.verification_token,
        verified: model.verified,
        verified_at: model.verified_at,
        created_at: model.created_at,
    }
}

/// Basic shape check for a bare domain name.
fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain.len() <= 253
        && domain.contains('.')
        && !domain.contains("..")
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Register a domain and receive its verification token.
#[utoipa::path(
    post,
    path = "/api/v1/domains",
    tag = "Domains",
    request_body = RegisterDomainRequest,
    responses(
        (status = 201, description = "Domain registered", body = DomainResponse),
        (status = 400, description = "Invalid domain", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/domains")]
pub async fn register_domain(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    body: web::Json<RegisterDomainRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "register domains")?;
    let workspace_id = auth.require_workspace()?;

    let req = body.into_inner();
    let domain_name = req.domain.trim().to_lowercase();
    if !is_valid_domain(&domain_name) {
        return Err(AppError::InvalidInput(format!(
            "'{}' is not a valid domain name",
            req.domain
        )));
    }

    let token = generate_token();
    let model = pool
        .insert_domain(Uuid::now_v7(), workspace_id, &domain_name, &token)
        .await?;

    info!(domain = %domain_name, "Domain registered for verification");
    Ok(HttpResponse::Created().json(to_response(model)))
}

/// List registered domains.
#[utoipa::path(
    get,
    path = "/api/v1/domains",
    tag = "Domains",
    responses(
        (status = 200, description = "Domain list"),
    ),
    security(("api_key" = []))
)]
#[get("/domains")]
pub async fn list_domains(auth: ApiKeyAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let domains = pool.list_domains(workspace_id).await?;

    let domains: Vec<DomainResponse> = domains.into_iter().map(to_response).collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "domains": domains })))
}

/// Verify a domain by checking its DNS TXT record for the stored token.
#[utoipa::path(
    post,
    path = "/api/v1/domains/{id}/verify",
    tag = "Domains",
    params(("id" = Uuid, Path, description = "Domain UUID")),
    responses(
        (status = 200, description = "Verification outcome", body = VerifyDomainResponse),
        (status = 404, description = "Domain not found", body = crate::error::ErrorResponse),
        (status = 502, description = "DNS resolution failed", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/domains/{id}/verify")]
pub async fn verify_domain(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    verifier: web::Data<DomainVerifier>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "verify domains")?;
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let domain = pool
        .get_domain_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Domain {}", id)))?;

    if domain.verified {
        return Ok(HttpResponse::Ok().json(VerifyDomainResponse {
            success: true,
            message: format!("Domain {} is already verified", domain.domain),
        }));
    }

    let matched = verifier
        .verify(&domain.domain, &domain.verification_token)
        .await?;

    if matched {
        pool.mark_domain_verified(workspace_id, id).await?;
        info!(domain = %domain.domain, "Domain verified");
        Ok(HttpResponse::Ok().json(VerifyDomainResponse {
            success: true,
            message: format!("Domain {} verified", domain.domain),
        }))
    } else {
        Ok(HttpResponse::Ok().json(VerifyDomainResponse {
            success: false,
            message: format!(
                "No TXT record with the verification token found at {}",
                record_name(&domain.domain)
            ),
        }))
    }
}

/// Configure domain routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register_domain)
        .service(list_domains)
        .service(verify_domain);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_validation() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("sub.example-site.co.uk"));
        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("nodots"));
        assert!(!is_valid_domain(".leading.dot"));
        assert!(!is_valid_domain("trailing.dot."));
        assert!(!is_valid_domain("bad..dots.com"));
        assert!(!is_valid_domain("spaces in.domain.com"));
    }
}

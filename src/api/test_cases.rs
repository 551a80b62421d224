//! Test case API handlers.

use actix_web::{HttpResponse, delete, get, post, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::db::{DbPool, string_vec_from_json};
use crate::entity::test_case;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateTestCaseRequest, ImportTestCasesRequest, ImportTestCasesResponse, QueryTestCasesParams,
    Severity, TestCaseDetailResponse, TestCaseListResponse, TestType,
};

use super::forbid_viewer;

fn to_response(model: test_case::Model) -> TestCaseDetailResponse {
    TestCaseDetailResponse {
        id: model.id,
        category: model.category,
        question: model.question,
        expected_answer: model.expected_answer,
        min_pass_score: model.min_pass_score,
        test_type: TestType::parse(&model.test_type).unwrap_or_default(),
        severity: model.severity.as_deref().and_then(Severity::parse),
        attack_category: model.attack_category,
        detection_patterns: string_vec_from_json(model.detection_patterns.as_ref()),
        tags: string_vec_from_json(model.tags.as_ref()),
        difficulty: model.difficulty,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Reject malformed creation requests; returns the reason.
fn validate_request(req: &CreateTestCaseRequest) -> Option<String> {
    if req.question.trim().is_empty() {
        return Some("question is required".to_string());
    }
    if req.expected_answer.trim().is_empty() {
        return Some("expected_answer is required".to_string());
    }
    if req.category.trim().is_empty() {
        return Some("category is required".to_string());
    }
    if !(0.0..=100.0).contains(&req.min_pass_score) {
        return Some("min_pass_score must be between 0 and 100".to_string());
    }
    if req.test_type == TestType::Functional
        && (req.severity.is_some() || req.attack_category.is_some())
    {
        return Some("severity/attack_category only apply to security cases".to_string());
    }
    None
}

/// Create a test case.
#[utoipa::path(
    post,
    path = "/api/v1/test-cases",
    tag = "TestCases",
    request_body = CreateTestCaseRequest,
    responses(
        (status = 201, description = "Test case created", body = TestCaseDetailResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/test-cases")]
pub async fn create_test_case(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateTestCaseRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "create test cases")?;
    let workspace_id = auth.require_workspace()?;

    let req = body.into_inner();
    if let Some(reason) = validate_request(&req) {
        return Err(AppError::InvalidInput(reason));
    }

    let id = Uuid::now_v7();
    let model = pool.insert_test_case(id, workspace_id, &req).await?;

    info!(test_case_id = %id, category = %model.category, "Test case created");
    Ok(HttpResponse::Created().json(to_response(model)))
}

/// Bulk-import test cases.
///
/// Valid entries are created; invalid ones are reported back by position
/// without aborting the rest.
#[utoipa::path(
    post,
    path = "/api/v1/test-cases/import",
    tag = "TestCases",
    request_body = ImportTestCasesRequest,
    responses(
        (status = 200, description = "Import outcome", body = ImportTestCasesResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/test-cases/import")]
pub async fn import_test_cases(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    body: web::Json<ImportTestCasesRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "import test cases")?;
    let workspace_id = auth.require_workspace()?;

    let req = body.into_inner();
    let mut imported = 0u32;
    let mut rejected = Vec::new();

    for (index, case) in req.test_cases.iter().enumerate() {
        if let Some(reason) = validate_request(case) {
            rejected.push(format!("entry {}: {}", index, reason));
            continue;
        }
        pool.insert_test_case(Uuid::now_v7(), workspace_id, case)
            .await?;
        imported += 1;
    }

    info!(imported, rejected = rejected.len(), "Test case import finished");
    Ok(HttpResponse::Ok().json(ImportTestCasesResponse { imported, rejected }))
}

/// List test cases with filters.
#[utoipa::path(
    get,
    path = "/api/v1/test-cases",
    tag = "TestCases",
    responses(
        (status = 200, description = "Test case list", body = TestCaseListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[get("/test-cases")]
pub async fn list_test_cases(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    query: web::Query<QueryTestCasesParams>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let params = query.into_inner();

    let (cases, total) = pool.query_test_cases(workspace_id, &params).await?;

    Ok(HttpResponse::Ok().json(TestCaseListResponse {
        test_cases: cases.into_iter().map(to_response).collect(),
        total,
        limit: params.limit,
        offset: params.offset,
    }))
}

/// Get one test case.
#[utoipa::path(
    get,
    path = "/api/v1/test-cases/{id}",
    tag = "TestCases",
    params(("id" = Uuid, Path, description = "Test case UUID")),
    responses(
        (status = 200, description = "Test case details", body = TestCaseDetailResponse),
        (status = 404, description = "Test case not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[get("/test-cases/{id}")]
pub async fn get_test_case(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let case = pool
        .get_test_case_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Test case {}", id)))?;

    Ok(HttpResponse::Ok().json(to_response(case)))
}

/// Soft-delete a test case.
#[utoipa::path(
    delete,
    path = "/api/v1/test-cases/{id}",
    tag = "TestCases",
    params(("id" = Uuid, Path, description = "Test case UUID")),
    responses(
        (status = 200, description = "Test case deleted"),
        (status = 404, description = "Test case not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[delete("/test-cases/{id}")]
pub async fn delete_test_case(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "delete test cases")?;
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    if !pool.delete_test_case(workspace_id, id).await? {
        return Err(AppError::NotFound(format!("Test case {}", id)));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Test case deleted", "id": id })))
}

/// Configure test case routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_test_case)
        .service(import_test_cases)
        .service(list_test_cases)
        .service(get_test_case)
        .service(delete_test_case);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CreateTestCaseRequest {
        CreateTestCaseRequest {
            category: "billing".to_string(),
            question: "What is the refund window?".to_string(),
            expected_answer: "30 days".to_string(),
            min_pass_score: 85.0,
            test_type: TestType::Functional,
            severity: None,
            attack_category: None,
            detection_patterns: vec![],
            tags: vec![],
            difficulty: None,
        }
    }

    #[test]
    fn test_validate_accepts_wellformed() {
        assert!(validate_request(&base_request()).is_none());
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let mut req = base_request();
        req.question = "  ".to_string();
        assert!(validate_request(&req).is_some());

        let mut req = base_request();
        req.expected_answer = String::new();
        assert!(validate_request(&req).is_some());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut req = base_request();
        req.min_pass_score = 150.0;
        assert!(validate_request(&req).is_some());
    }

    #[test]
    fn test_validate_rejects_security_fields_on_functional() {
        let mut req = base_request();
        req.severity = Some(Severity::High);
        assert!(validate_request(&req).is_some());
    }
}

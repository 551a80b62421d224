//! Execution API handlers.

use actix_web::{HttpResponse, get, patch, web};
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::db::{DbPool, string_vec_from_json};
use crate::entity::execution;
use crate::error::{AppError, AppResult};
use crate::models::{
    ExecutionDetailResponse, ExecutionListResponse, ExecutionStatus, QueryExecutionsParams,
    ReviewExecutionRequest, ScoreSet,
};

use super::forbid_viewer;

fn to_response(model: execution::Model) -> ExecutionDetailResponse {
    let scores = match (
        model.similarity_score,
        model.factual_accuracy,
        model.relevance_score,
    ) {
        (Some(similarity), Some(factual_accuracy), Some(relevance)) => Some(ScoreSet {
            similarity,
            factual_accuracy,
            relevance,
        }),
        _ => None,
    };

    ExecutionDetailResponse {
        id: model.id,
        test_case_id: model.test_case_id,
        agent_id: model.agent_id,
        batch_id: model.batch_id,
        actual_answer: model.actual_answer,
        scores,
        status: ExecutionStatus::parse(&model.status).unwrap_or(ExecutionStatus::Pending),
        justification: model.justification,
        cognitive_gaps: string_vec_from_json(model.cognitive_gaps.as_ref()),
        improvement_suggestions: string_vec_from_json(model.improvement_suggestions.as_ref()),
        latency_ms: model.latency_ms,
        tokens_used: model.tokens_used,
        cost_usd: model.cost_usd,
        review_note: model.review_note,
        reviewed_by: model.reviewed_by,
        reviewed_at: model.reviewed_at,
        created_at: model.created_at,
    }
}

/// List executions with filters.
#[utoipa::path(
    get,
    path = "/api/v1/executions",
    tag = "Executions",
    responses(
        (status = 200, description = "Execution list", body = ExecutionListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[get("/executions")]
pub async fn list_executions(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    query: web::Query<QueryExecutionsParams>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let params = query.into_inner();

    let (executions, total) = pool.query_executions(workspace_id, &params).await?;

    Ok(HttpResponse::Ok().json(ExecutionListResponse {
        executions: executions.into_iter().map(to_response).collect(),
        total,
        limit: params.limit,
        offset: params.offset,
    }))
}

/// Get one execution.
#[utoipa::path(
    get,
    path = "/api/v1/executions/{id}",
    tag = "Executions",
    params(("id" = Uuid, Path, description = "Execution UUID")),
    responses(
        (status = 200, description = "Execution details", body = ExecutionDetailResponse),
        (status = 404, description = "Execution not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[get("/executions/{id}")]
pub async fn get_execution(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let execution = pool
        .get_execution_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Execution {}", id)))?;

    Ok(HttpResponse::Ok().json(to_response(execution)))
}

/// Attach a human review note to an execution.
///
/// Review fields are the only permitted mutation after validation completes.
#[utoipa::path(
    patch,
    path = "/api/v1/executions/{id}/review",
    tag = "Executions",
    params(("id" = Uuid, Path, description = "Execution UUID")),
    request_body = ReviewExecutionRequest,
    responses(
        (status = 200, description = "Review recorded", body = ExecutionDetailResponse),
        (status = 404, description = "Execution not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[patch("/executions/{id}/review")]
pub async fn review_execution(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<ReviewExecutionRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "review executions")?;
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let req = body.into_inner();
    if req.review_note.trim().is_empty() {
        return Err(AppError::InvalidInput("review_note is required".to_string()));
    }

    let model = pool
        .review_execution(workspace_id, id, &auth.caller.name, &req.review_note)
        .await?;

    Ok(HttpResponse::Ok().json(to_response(model)))
}

/// Configure execution routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_executions)
        .service(get_execution)
        .service(review_execution);
}

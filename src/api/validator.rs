//! Validator API handler - scores one expected-vs-actual comparison and
//! persists the result onto its execution.

use actix_web::{HttpResponse, post, web};
use std::time::Instant;
use tracing::info;

use crate::auth::ApiKeyAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ValidateRequest, ValidateResponse, WsEvent, WsEventMessage};
use crate::services::EventBroadcaster;
use crate::services::validator::{ScoringClient, ScoringInput};

use super::forbid_viewer;

/// Validate one (question, expected, actual) triple.
///
/// Issues a single scoring call, writes scores/justification/status onto the
/// execution, and returns the structured outcome.
#[utoipa::path(
    post,
    path = "/api/v1/validator/validate",
    tag = "Validator",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Validation recorded", body = ValidateResponse),
        (status = 404, description = "Execution not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Content blocked by safety filter", body = crate::error::ErrorResponse),
        (status = 429, description = "Upstream rate limit", body = crate::error::ErrorResponse),
        (status = 502, description = "Upstream failure", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/validator/validate")]
pub async fn validate(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    scorer: web::Data<dyn ScoringClient>,
    broadcaster: web::Data<EventBroadcaster>,
    body: web::Json<ValidateRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "validate executions")?;
    let workspace_id = auth.require_workspace()?;

    let req = body.into_inner();

    let execution = pool
        .get_execution_by_id(workspace_id, req.execution_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Execution {}", req.execution_id)))?;

    let input = ScoringInput {
        question: req.question,
        expected_answer: req.expected_answer,
        actual_answer: req.actual_answer.clone(),
    };

    let started = Instant::now();
    let scored = scorer.score(&input).await.map_err(AppError::from)?;
    let latency_ms = started.elapsed().as_millis() as i64;

    let (input_cost, output_cost) = scorer.cost_per_token();
    let tokens_used = scored.usage.map(|u| u.total() as i64);
    let cost_usd = scored.usage.map(|u| u.cost(input_cost, output_cost));

    let model = pool
        .record_validation(
            req.execution_id,
            &req.actual_answer,
            &scored.outcome,
            Some(latency_ms),
            tokens_used,
            cost_usd,
        )
        .await?;

    let status = scored.outcome.status();

    broadcaster.send(WsEventMessage::new(WsEvent::execution_recorded(
        model.id,
        execution.agent_id,
        execution.test_case_id,
        status,
        execution.batch_id,
    )));

    info!(
        execution_id = %model.id,
        status = %status,
        "Validation recorded"
    );

    Ok(HttpResponse::Ok().json(ValidateResponse {
        success: true,
        validation: scored.outcome,
        status,
    }))
}

/// Configure validator routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(validate);
}

//! Batch execution API handlers - dispatch, progress, cancellation.

use actix_web::{HttpResponse, get, post, web};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::config::Config;
use crate::db::{DbPool, string_vec_from_json, uuid_vec_from_json};
use crate::entity::batch_execution;
use crate::error::{AppError, AppResult};
use crate::models::{
    BatchDetailResponse, BatchListResponse, BatchStatus, DispatchMode, DispatchRequest,
    DispatchResponse, QueryBatchesParams, TestType, WsEvent, WsEventMessage,
};
use crate::services::dispatcher::{AgentSpec, BatchPlan, CaseSpec};
use crate::services::agent_client::AgentEndpoint;
use crate::services::{BatchRegistry, BatchRunner, EventBroadcaster, ExecutionPolicy};

use super::forbid_viewer;

fn to_response(model: batch_execution::Model) -> BatchDetailResponse {
    BatchDetailResponse {
        id: model.id,
        agent_ids: uuid_vec_from_json(&model.agent_ids),
        test_case_ids: uuid_vec_from_json(&model.test_case_ids),
        status: BatchStatus::parse(&model.status).unwrap_or(BatchStatus::Failed),
        total_tests: model.total_tests,
        completed_tests: model.completed_tests,
        successful_tests: model.successful_tests,
        failed_tests: model.failed_tests,
        error_log: string_vec_from_json(Some(&model.error_log)),
        started_at: model.started_at,
        completed_at: model.completed_at,
        created_at: model.created_at,
    }
}

/// Dispatch a batch: one scoring attempt per (agent, test case) pair.
///
/// Runs the fan-out to completion and returns the aggregate summary. Clients
/// follow live progress over the WebSocket channel or by polling the batch.
#[utoipa::path(
    post,
    path = "/api/v1/batches/dispatch",
    tag = "Batches",
    request_body = DispatchRequest,
    responses(
        (status = 200, description = "Batch finished", body = DispatchResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/batches/dispatch")]
pub async fn dispatch_batch(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    broadcaster: web::Data<EventBroadcaster>,
    runner: web::Data<BatchRunner>,
    body: web::Json<DispatchRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "dispatch batches")?;
    let workspace_id = auth.require_workspace()?;

    let req = body.into_inner();
    if req.agent_ids.is_empty() {
        return Err(AppError::InvalidInput("agent_ids must not be empty".to_string()));
    }
    if req.test_case_ids.is_empty() {
        return Err(AppError::InvalidInput(
            "test_case_ids must not be empty".to_string(),
        ));
    }

    // Every referenced id must resolve inside the workspace
    let agents = pool.find_active_agents(workspace_id, &req.agent_ids).await?;
    if agents.len() != req.agent_ids.len() {
        return Err(AppError::InvalidInput(format!(
            "{} of {} agents are unknown or inactive",
            req.agent_ids.len() - agents.len(),
            req.agent_ids.len()
        )));
    }

    let cases = pool.find_test_cases(workspace_id, &req.test_case_ids).await?;
    if cases.len() != req.test_case_ids.len() {
        return Err(AppError::InvalidInput(format!(
            "{} of {} test cases are unknown",
            req.test_case_ids.len() - cases.len(),
            req.test_case_ids.len()
        )));
    }

    let policy = match req.mode {
        DispatchMode::Sequential => ExecutionPolicy::Sequential {
            delay: Duration::from_millis(config.dispatch.security_call_delay_ms),
        },
        DispatchMode::Concurrent => {
            let max_in_flight = req
                .concurrency
                .unwrap_or(config.dispatch.default_concurrency)
                .clamp(1, config.dispatch.max_concurrency);
            ExecutionPolicy::Bounded { max_in_flight }
        }
    };

    let batch = pool
        .insert_batch(Uuid::now_v7(), workspace_id, &req.agent_ids, &req.test_case_ids)
        .await?;
    let batch_id = batch.id;

    broadcaster.send(WsEventMessage::new(WsEvent::batch_created(
        batch_id,
        agents.len() as i32,
        cases.len() as i32,
    )));

    info!(
        batch_id = %batch_id,
        agents = agents.len(),
        cases = cases.len(),
        total = batch.total_tests,
        ?policy,
        "Batch dispatched"
    );

    let plan = BatchPlan {
        batch_id,
        workspace_id,
        agents: agents
            .into_iter()
            .map(|a| AgentSpec {
                id: a.id,
                endpoint: AgentEndpoint {
                    name: a.name,
                    platform_type: a.platform_type,
                    connection_secret_ref: a.connection_secret_ref,
                },
            })
            .collect(),
        cases: cases
            .into_iter()
            .map(|c| CaseSpec {
                id: c.id,
                question: c.question,
                expected_answer: c.expected_answer,
                security: TestType::parse(&c.test_type) == Some(TestType::Security),
                detection_patterns: string_vec_from_json(c.detection_patterns.as_ref()),
            })
            .collect(),
        policy,
    };

    let results = runner.run(plan).await?;

    let message = format!(
        "Batch execution finished: {} succeeded, {} failed",
        results.success, results.failed
    );

    Ok(HttpResponse::Ok().json(DispatchResponse {
        success: true,
        batch_id,
        results,
        message,
    }))
}

/// List batches (the active-batch poll uses `?status=running`).
#[utoipa::path(
    get,
    path = "/api/v1/batches",
    tag = "Batches",
    responses(
        (status = 200, description = "Batch list", body = BatchListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[get("/batches")]
pub async fn list_batches(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    query: web::Query<QueryBatchesParams>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let params = query.into_inner();

    let (batches, total) = pool.query_batches(workspace_id, &params).await?;

    Ok(HttpResponse::Ok().json(BatchListResponse {
        batches: batches.into_iter().map(to_response).collect(),
        total,
        limit: params.limit,
        offset: params.offset,
    }))
}

/// Get one batch with its progress counters.
#[utoipa::path(
    get,
    path = "/api/v1/batches/{id}",
    tag = "Batches",
    params(("id" = Uuid, Path, description = "Batch UUID")),
    responses(
        (status = 200, description = "Batch details", body = BatchDetailResponse),
        (status = 404, description = "Batch not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[get("/batches/{id}")]
pub async fn get_batch(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let batch = pool
        .get_batch_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Batch {}", id)))?;

    Ok(HttpResponse::Ok().json(to_response(batch)))
}

/// Cancel a batch.
///
/// Cancellation is cooperative: the persisted status flips to `cancelled`
/// with a completion timestamp, the in-process flag stops new dispatches, and
/// in-flight calls finish without reaching the counters. Recorded counts are
/// never changed retroactively.
#[utoipa::path(
    post,
    path = "/api/v1/batches/{id}/cancel",
    tag = "Batches",
    params(("id" = Uuid, Path, description = "Batch UUID")),
    responses(
        (status = 200, description = "Batch cancelled", body = BatchDetailResponse),
        (status = 400, description = "Batch already terminal", body = crate::error::ErrorResponse),
        (status = 404, description = "Batch not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/batches/{id}/cancel")]
pub async fn cancel_batch(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    registry: web::Data<BatchRegistry>,
    broadcaster: web::Data<EventBroadcaster>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "cancel batches")?;
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let batch = pool
        .get_batch_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Batch {}", id)))?;

    if !pool.cancel_batch(workspace_id, id).await? {
        return Err(AppError::InvalidInput(format!(
            "Batch {} is already {}",
            id, batch.status
        )));
    }

    // Stop new dispatches in this process; in-flight calls run to completion
    registry.cancel(id).await;

    let cancelled = pool
        .get_batch_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Batch {}", id)))?;

    broadcaster.send(WsEventMessage::new(WsEvent::batch_completed(
        id,
        BatchStatus::Cancelled,
        cancelled.successful_tests,
        cancelled.failed_tests,
    )));

    info!(batch_id = %id, "Batch cancelled");
    Ok(HttpResponse::Ok().json(to_response(cancelled)))
}

/// Configure batch routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(dispatch_batch)
        .service(list_batches)
        .service(get_batch)
        .service(cancel_batch);
}

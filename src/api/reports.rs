//! Report and metrics API handlers - generation, review workflow, and the
//! read-side aggregates they are built from.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::db::DbPool;
use crate::entity::review_report as review_report_entity;
use crate::error::{AppError, AppResult};
use crate::models::{
    GenerateReportRequest, ReportDetailResponse, ReportKind, ReportListResponse,
    ReviewReportRequest, ReviewState, WsEvent, WsEventMessage,
};
use crate::services::{EventBroadcaster, reporting};

use super::forbid_viewer;

fn to_response(model: review_report_entity::Model) -> ReportDetailResponse {
    ReportDetailResponse {
        id: model.id,
        kind: ReportKind::parse(&model.kind).unwrap_or(ReportKind::Improvement),
        period_start: model.period_start,
        period_end: model.period_end,
        payload: model.payload,
        review_state: ReviewState::parse(&model.review_state).unwrap_or(ReviewState::Pending),
        reviewed_by: model.reviewed_by,
        review_note: model.review_note,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Generate a report over a period and open its review workflow.
#[utoipa::path(
    post,
    path = "/api/v1/reports/generate",
    tag = "Reports",
    request_body = GenerateReportRequest,
    responses(
        (status = 201, description = "Report generated", body = ReportDetailResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/reports/generate")]
pub async fn generate_report(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    body: web::Json<GenerateReportRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "generate reports")?;
    let workspace_id = auth.require_workspace()?;

    let req = body.into_inner();
    if req.period_end <= req.period_start {
        return Err(AppError::InvalidInput(
            "period_end must be after period_start".to_string(),
        ));
    }

    let payload = reporting::generate_payload(
        &pool,
        workspace_id,
        req.kind,
        req.period_start,
        req.period_end,
    )
    .await?;

    let id = Uuid::now_v7();
    let model = pool
        .insert_report(
            id,
            workspace_id,
            req.kind,
            req.period_start,
            req.period_end,
            payload,
        )
        .await?;

    info!(report_id = %id, kind = %req.kind, "Report generated");
    Ok(HttpResponse::Created().json(to_response(model)))
}

/// List reports.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "Reports",
    responses(
        (status = 200, description = "Report list", body = ReportListResponse),
    ),
    security(("api_key" = []))
)]
#[get("/reports")]
pub async fn list_reports(auth: ApiKeyAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let (reports, total) = pool.list_reports(workspace_id).await?;

    Ok(HttpResponse::Ok().json(ReportListResponse {
        reports: reports.into_iter().map(to_response).collect(),
        total,
    }))
}

/// Get one report.
#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report UUID")),
    responses(
        (status = 200, description = "Report details", body = ReportDetailResponse),
        (status = 404, description = "Report not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[get("/reports/{id}")]
pub async fn get_report(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let report = pool
        .get_report_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

    Ok(HttpResponse::Ok().json(to_response(report)))
}

/// Move a report through the review workflow.
///
/// pending -> under_review -> {approved, rejected, requires_changes};
/// requires_changes -> under_review. Invalid transitions are rejected.
#[utoipa::path(
    post,
    path = "/api/v1/reports/{id}/review",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report UUID")),
    request_body = ReviewReportRequest,
    responses(
        (status = 200, description = "Review state updated", body = ReportDetailResponse),
        (status = 400, description = "Invalid transition", body = crate::error::ErrorResponse),
        (status = 404, description = "Report not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/reports/{id}/review")]
pub async fn review_report(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    broadcaster: web::Data<EventBroadcaster>,
    path: web::Path<Uuid>,
    body: web::Json<ReviewReportRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "review reports")?;
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let req = body.into_inner();
    let report = pool
        .get_report_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

    let current = ReviewState::parse(&report.review_state).unwrap_or(ReviewState::Pending);
    if !current.can_transition(req.state) {
        return Err(AppError::InvalidInput(format!(
            "Cannot move report from {} to {}",
            current, req.state
        )));
    }

    let model = pool
        .set_report_review_state(
            workspace_id,
            id,
            req.state,
            &auth.caller.name,
            req.review_note.as_deref(),
        )
        .await?;

    broadcaster.send(WsEventMessage::new(WsEvent::report_review_updated(
        id,
        req.state.as_str(),
    )));

    info!(report_id = %id, state = %req.state, "Report review state updated");
    Ok(HttpResponse::Ok().json(to_response(model)))
}

/// Query window for metrics endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MetricsWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Per-agent quality/speed/cost metrics over a window.
#[utoipa::path(
    get,
    path = "/api/v1/metrics/agents",
    tag = "Reports",
    responses(
        (status = 200, description = "Per-agent metrics"),
    ),
    security(("api_key" = []))
)]
#[get("/metrics/agents")]
pub async fn agent_metrics(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    query: web::Query<MetricsWindow>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let window = query.into_inner();

    let metrics = pool.agent_metrics(workspace_id, window.from, window.to).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "agents": metrics })))
}

/// Security-compliance summary over a window.
#[utoipa::path(
    get,
    path = "/api/v1/metrics/compliance",
    tag = "Reports",
    responses(
        (status = 200, description = "Compliance summary", body = crate::models::ComplianceSummary),
    ),
    security(("api_key" = []))
)]
#[get("/metrics/compliance")]
pub async fn compliance_metrics(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    query: web::Query<MetricsWindow>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let window = query.into_inner();

    let summary = pool
        .compliance_summary(workspace_id, window.from, window.to)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Configure report and metrics routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(generate_report)
        .service(list_reports)
        .service(get_report)
        .service(review_report)
        .service(agent_metrics)
        .service(compliance_metrics);
}

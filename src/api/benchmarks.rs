//! Benchmark API handlers.

use actix_web::{HttpResponse, get, post, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::db::{DbPool, uuid_vec_from_json};
use crate::entity::benchmark;
use crate::error::{AppError, AppResult};
use crate::models::{
    BenchmarkDetailResponse, BenchmarkListResponse, BenchmarkSnapshot, CreateBenchmarkRequest,
};
use crate::services::reporting;

use super::forbid_viewer;

fn to_response(model: benchmark::Model) -> BenchmarkDetailResponse {
    let results_snapshot: BenchmarkSnapshot =
        serde_json::from_value(model.results_snapshot).unwrap_or_default();

    BenchmarkDetailResponse {
        id: model.id,
        name: model.name,
        description: model.description,
        agent_ids: uuid_vec_from_json(&model.agent_ids),
        test_case_ids: uuid_vec_from_json(&model.test_case_ids),
        results_snapshot,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Create a benchmark.
#[utoipa::path(
    post,
    path = "/api/v1/benchmarks",
    tag = "Benchmarks",
    request_body = CreateBenchmarkRequest,
    responses(
        (status = 201, description = "Benchmark created", body = BenchmarkDetailResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/benchmarks")]
pub async fn create_benchmark(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateBenchmarkRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "create benchmarks")?;
    let workspace_id = auth.require_workspace()?;

    let req = body.into_inner();
    if req.name.trim().is_empty() {
        return Err(AppError::InvalidInput("name is required".to_string()));
    }
    if req.agent_ids.is_empty() || req.test_case_ids.is_empty() {
        return Err(AppError::InvalidInput(
            "agent_ids and test_case_ids must not be empty".to_string(),
        ));
    }

    let agents = pool.find_active_agents(workspace_id, &req.agent_ids).await?;
    if agents.len() != req.agent_ids.len() {
        return Err(AppError::InvalidInput(
            "benchmark references unknown or inactive agents".to_string(),
        ));
    }
    let cases = pool.find_test_cases(workspace_id, &req.test_case_ids).await?;
    if cases.len() != req.test_case_ids.len() {
        return Err(AppError::InvalidInput(
            "benchmark references unknown test cases".to_string(),
        ));
    }

    let id = Uuid::now_v7();
    let model = pool.insert_benchmark(id, workspace_id, &req).await?;

    info!(benchmark_id = %id, name = %model.name, "Benchmark created");
    Ok(HttpResponse::Created().json(to_response(model)))
}

/// List benchmarks.
#[utoipa::path(
    get,
    path = "/api/v1/benchmarks",
    tag = "Benchmarks",
    responses(
        (status = 200, description = "Benchmark list", body = BenchmarkListResponse),
    ),
    security(("api_key" = []))
)]
#[get("/benchmarks")]
pub async fn list_benchmarks(auth: ApiKeyAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let (benchmarks, total) = pool.list_benchmarks(workspace_id).await?;

    Ok(HttpResponse::Ok().json(BenchmarkListResponse {
        benchmarks: benchmarks.into_iter().map(to_response).collect(),
        total,
    }))
}

/// Get one benchmark with its current snapshot.
#[utoipa::path(
    get,
    path = "/api/v1/benchmarks/{id}",
    tag = "Benchmarks",
    params(("id" = Uuid, Path, description = "Benchmark UUID")),
    responses(
        (status = 200, description = "Benchmark details", body = BenchmarkDetailResponse),
        (status = 404, description = "Benchmark not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[get("/benchmarks/{id}")]
pub async fn get_benchmark(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let bench = pool
        .get_benchmark_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Benchmark {}", id)))?;

    Ok(HttpResponse::Ok().json(to_response(bench)))
}

/// Refresh a benchmark's results snapshot from recorded executions.
#[utoipa::path(
    post,
    path = "/api/v1/benchmarks/{id}/refresh",
    tag = "Benchmarks",
    params(("id" = Uuid, Path, description = "Benchmark UUID")),
    responses(
        (status = 200, description = "Snapshot refreshed", body = BenchmarkDetailResponse),
        (status = 404, description = "Benchmark not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/benchmarks/{id}/refresh")]
pub async fn refresh_benchmark(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "refresh benchmarks")?;
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let bench = pool
        .get_benchmark_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Benchmark {}", id)))?;

    let agent_ids = uuid_vec_from_json(&bench.agent_ids);
    let test_case_ids = uuid_vec_from_json(&bench.test_case_ids);

    reporting::refresh_benchmark_snapshot(&pool, workspace_id, id, &agent_ids, &test_case_ids)
        .await?;

    let refreshed = pool
        .get_benchmark_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Benchmark {}", id)))?;

    Ok(HttpResponse::Ok().json(to_response(refreshed)))
}

/// Configure benchmark routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_benchmark)
        .service(list_benchmarks)
        .service(get_benchmark)
        .service(refresh_benchmark);
}

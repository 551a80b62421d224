//! Agent API handlers.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::db::DbPool;
use crate::entity::agent;
use crate::error::{AppError, AppResult};
use crate::models::{
    AgentDetailResponse, AgentListResponse, AgentStatus, CreateAgentRequest, PlatformType,
    UpdateAgentRequest,
};

use super::forbid_viewer;

fn to_response(model: agent::Model) -> AgentDetailResponse {
    AgentDetailResponse {
        id: model.id,
        name: model.name,
        platform_type: PlatformType::parse(&model.platform_type).unwrap_or(PlatformType::Webhook),
        connection_secret_ref: model.connection_secret_ref,
        status: AgentStatus::parse(&model.status).unwrap_or(AgentStatus::Inactive),
        global: model.workspace_id.is_none(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Create an agent.
#[utoipa::path(
    post,
    path = "/api/v1/agents",
    tag = "Agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created", body = AgentDetailResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[post("/agents")]
pub async fn create_agent(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateAgentRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "create agents")?;

    let req = body.into_inner();
    if req.name.trim().is_empty() {
        return Err(AppError::InvalidInput("Agent name is required".to_string()));
    }
    if req.connection_secret_ref.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "connection_secret_ref is required".to_string(),
        ));
    }

    // Global agents are instance-wide; only admins may create them
    let workspace_id = if req.global {
        if !auth.caller.is_admin() {
            return Err(AppError::Unauthorized(
                "Admin role required to create global agents".to_string(),
            ));
        }
        None
    } else {
        Some(auth.require_workspace()?)
    };

    let id = Uuid::now_v7();
    let model = pool.insert_agent(id, workspace_id, &req).await?;

    info!(agent_id = %id, name = %model.name, "Agent created");
    Ok(HttpResponse::Created().json(to_response(model)))
}

/// List agents visible to the caller's workspace.
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "Agents",
    responses(
        (status = 200, description = "Agent list", body = AgentListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[get("/agents")]
pub async fn list_agents(auth: ApiKeyAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let (agents, total) = pool.list_agents(workspace_id).await?;

    Ok(HttpResponse::Ok().json(AgentListResponse {
        agents: agents.into_iter().map(to_response).collect(),
        total,
    }))
}

/// Get one agent.
#[utoipa::path(
    get,
    path = "/api/v1/agents/{id}",
    tag = "Agents",
    params(("id" = Uuid, Path, description = "Agent UUID")),
    responses(
        (status = 200, description = "Agent details", body = AgentDetailResponse),
        (status = 404, description = "Agent not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[get("/agents/{id}")]
pub async fn get_agent(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let agent = pool
        .get_agent_by_id(workspace_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Agent {}", id)))?;

    Ok(HttpResponse::Ok().json(to_response(agent)))
}

/// Update an agent.
#[utoipa::path(
    patch,
    path = "/api/v1/agents/{id}",
    tag = "Agents",
    params(("id" = Uuid, Path, description = "Agent UUID")),
    request_body = UpdateAgentRequest,
    responses(
        (status = 200, description = "Agent updated", body = AgentDetailResponse),
        (status = 404, description = "Agent not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[patch("/agents/{id}")]
pub async fn update_agent(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateAgentRequest>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "update agents")?;
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    let model = pool.update_agent(workspace_id, id, &body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(to_response(model)))
}

/// Soft-delete an agent.
#[utoipa::path(
    delete,
    path = "/api/v1/agents/{id}",
    tag = "Agents",
    params(("id" = Uuid, Path, description = "Agent UUID")),
    responses(
        (status = 200, description = "Agent deleted"),
        (status = 404, description = "Agent not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
#[delete("/agents/{id}")]
pub async fn delete_agent(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    forbid_viewer(&auth, "delete agents")?;
    let workspace_id = auth.require_workspace()?;
    let id = path.into_inner();

    if !pool.delete_agent(workspace_id, id).await? {
        return Err(AppError::NotFound(format!("Agent {}", id)));
    }

    info!(agent_id = %id, "Agent deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Agent deleted", "id": id })))
}

/// Configure agent routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_agent)
        .service(list_agents)
        .service(get_agent)
        .service(update_agent)
        .service(delete_agent);
}

//! Database queries for agents.
//!
//! Visibility rule: a workspace sees its own agents plus global agents
//! (workspace_id IS NULL).

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entity::agent::{self, ActiveModel, Entity as Agent};
use crate::error::{AppError, AppResult};
use crate::models::{AgentStatus, CreateAgentRequest, UpdateAgentRequest};

use super::DbPool;

/// Condition matching agents visible to a workspace (own + global).
fn visible_to(workspace_id: Uuid) -> Condition {
    Condition::any()
        .add(agent::Column::WorkspaceId.eq(workspace_id))
        .add(agent::Column::WorkspaceId.is_null())
}

impl DbPool {
    /// Insert a new agent.
    pub async fn insert_agent(
        &self,
        id: Uuid,
        workspace_id: Option<Uuid>,
        req: &CreateAgentRequest,
    ) -> AppResult<agent::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(id),
            workspace_id: Set(workspace_id),
            name: Set(req.name.clone()),
            platform_type: Set(req.platform_type.as_str().to_string()),
            connection_secret_ref: Set(req.connection_secret_ref.clone()),
            status: Set(AgentStatus::Active.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert agent: {}", e)))?;

        Ok(result)
    }

    /// Get an agent visible to a workspace.
    pub async fn get_agent_by_id(
        &self,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<agent::Model>> {
        let result = Agent::find_by_id(id)
            .filter(visible_to(workspace_id))
            .filter(agent::Column::DeletedAt.is_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get agent: {}", e)))?;

        Ok(result)
    }

    /// List agents visible to a workspace.
    pub async fn list_agents(&self, workspace_id: Uuid) -> AppResult<(Vec<agent::Model>, u64)> {
        let select = Agent::find()
            .filter(visible_to(workspace_id))
            .filter(agent::Column::DeletedAt.is_null());

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count agents: {}", e)))?;

        let agents = select
            .order_by_asc(agent::Column::Id) // UUIDv7 is time-ordered
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list agents: {}", e)))?;

        Ok((agents, total))
    }

    /// Resolve the subset of `ids` that are active and visible to the
    /// workspace. Used to validate dispatch requests.
    pub async fn find_active_agents(
        &self,
        workspace_id: Uuid,
        ids: &[Uuid],
    ) -> AppResult<Vec<agent::Model>> {
        let result = Agent::find()
            .filter(agent::Column::Id.is_in(ids.iter().copied()))
            .filter(visible_to(workspace_id))
            .filter(agent::Column::Status.eq(AgentStatus::Active.as_str()))
            .filter(agent::Column::DeletedAt.is_null())
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to resolve agents: {}", e)))?;

        Ok(result)
    }

    /// Update an agent's mutable fields.
    pub async fn update_agent(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        req: &UpdateAgentRequest,
    ) -> AppResult<agent::Model> {
        let agent = self
            .get_agent_by_id(workspace_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Agent {}", id)))?;

        let mut active: ActiveModel = agent.into();
        if let Some(ref name) = req.name {
            active.name = Set(name.clone());
        }
        if let Some(ref secret_ref) = req.connection_secret_ref {
            active.connection_secret_ref = Set(secret_ref.clone());
        }
        if let Some(status) = req.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update agent: {}", e)))?;

        Ok(result)
    }

    /// Soft-delete an agent. Returns false when it did not exist.
    pub async fn delete_agent(&self, workspace_id: Uuid, id: Uuid) -> AppResult<bool> {
        let Some(agent) = self.get_agent_by_id(workspace_id, id).await? else {
            return Ok(false);
        };

        let mut active: ActiveModel = agent.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete agent: {}", e)))?;

        Ok(true)
    }
}

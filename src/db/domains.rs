//! Database queries for verified domains.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::domain::{self, ActiveModel, Entity as Domain};
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// Insert a domain awaiting verification.
    pub async fn insert_domain(
        &self,
        id: Uuid,
        workspace_id: Uuid,
        domain_name: &str,
        verification_token: &str,
    ) -> AppResult<domain::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(id),
            workspace_id: Set(workspace_id),
            domain: Set(domain_name.to_string()),
            verification_token: Set(verification_token.to_string()),
            verified: Set(false),
            verified_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert domain: {}", e)))?;

        Ok(result)
    }

    /// Get a domain by ID within a workspace.
    pub async fn get_domain_by_id(
        &self,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<domain::Model>> {
        let result = Domain::find_by_id(id)
            .filter(domain::Column::WorkspaceId.eq(workspace_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get domain: {}", e)))?;

        Ok(result)
    }

    /// List domains in a workspace.
    pub async fn list_domains(&self, workspace_id: Uuid) -> AppResult<Vec<domain::Model>> {
        let result = Domain::find()
            .filter(domain::Column::WorkspaceId.eq(workspace_id))
            .order_by_asc(domain::Column::Domain)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list domains: {}", e)))?;

        Ok(result)
    }

    /// Mark a domain as verified.
    pub async fn mark_domain_verified(
        &self,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<domain::Model> {
        let domain = self
            .get_domain_by_id(workspace_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Domain {}", id)))?;

        let mut active: ActiveModel = domain.into();
        active.verified = Set(true);
        active.verified_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to mark domain verified: {}", e)))?;

        Ok(result)
    }
}

//! Database queries for workspaces.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::workspace::{self, ActiveModel, Entity as Workspace};
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// Insert a new workspace.
    pub async fn insert_workspace(
        &self,
        id: Uuid,
        name: &str,
        slug: &str,
    ) -> AppResult<workspace::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert workspace: {}", e)))?;

        Ok(result)
    }

    /// Get a workspace by ID.
    pub async fn get_workspace_by_id(&self, id: Uuid) -> AppResult<Option<workspace::Model>> {
        let result = Workspace::find_by_id(id)
            .filter(workspace::Column::DeletedAt.is_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get workspace: {}", e)))?;

        Ok(result)
    }

    /// Find a workspace by slug.
    pub async fn find_workspace_by_slug(&self, slug: &str) -> AppResult<Option<workspace::Model>> {
        let result = Workspace::find()
            .filter(workspace::Column::Slug.eq(slug))
            .filter(workspace::Column::DeletedAt.is_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find workspace: {}", e)))?;

        Ok(result)
    }
}

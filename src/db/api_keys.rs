//! Database queries for API keys.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::api_key::{self, ActiveModel, Entity as ApiKeyEntity};
use crate::error::{AppError, AppResult};
use crate::models::ApiKey;

use super::DbPool;

fn to_model(row: api_key::Model) -> ApiKey {
    ApiKey {
        id: row.id.to_string(),
        workspace_id: row.workspace_id,
        key_hash: row.key_hash,
        key_prefix: row.key_prefix,
        name: row.name,
        role: row.role,
        expires_at: row.expires_at,
        last_used_at: row.last_used_at,
        created_at: row.created_at,
        deleted_at: row.deleted_at,
    }
}

impl DbPool {
    /// Insert a new API key.
    pub async fn insert_api_key(&self, key: &ApiKey) -> AppResult<()> {
        let id = Uuid::parse_str(&key.id)?;

        let model = ActiveModel {
            id: Set(id),
            workspace_id: Set(key.workspace_id),
            key_hash: Set(key.key_hash.clone()),
            key_prefix: Set(key.key_prefix.clone()),
            name: Set(key.name.clone()),
            role: Set(key.role.clone()),
            expires_at: Set(key.expires_at),
            last_used_at: Set(key.last_used_at),
            created_at: Set(key.created_at),
            deleted_at: Set(key.deleted_at),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert API key: {}", e)))?;

        Ok(())
    }

    /// Look up a key by its SHA-256 hash.
    pub async fn find_api_key_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKey>> {
        let result = ApiKeyEntity::find()
            .filter(api_key::Column::KeyHash.eq(key_hash))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find API key: {}", e)))?;

        Ok(result.map(to_model))
    }

    /// Look up a key by ID.
    pub async fn find_api_key_by_id(&self, id: &str) -> AppResult<Option<ApiKey>> {
        let id = Uuid::parse_str(id)?;
        let result = ApiKeyEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find API key: {}", e)))?;

        Ok(result.map(to_model))
    }

    /// Update a key's last-used timestamp.
    pub async fn touch_api_key(&self, id: &str) -> AppResult<()> {
        let id = Uuid::parse_str(id)?;
        let Some(row) = ApiKeyEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find API key: {}", e)))?
        else {
            return Ok(());
        };

        let mut active: ActiveModel = row.into();
        active.last_used_at = Set(Some(Utc::now()));

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to touch API key: {}", e)))?;

        Ok(())
    }

    /// List all keys, newest first.
    pub async fn list_api_keys(&self) -> AppResult<Vec<ApiKey>> {
        let rows = ApiKeyEntity::find()
            .order_by_desc(api_key::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list API keys: {}", e)))?;

        Ok(rows.into_iter().map(to_model).collect())
    }

    /// Revoke a key (soft delete). Returns false when already revoked or missing.
    pub async fn revoke_api_key(&self, id: &str) -> AppResult<bool> {
        let id = Uuid::parse_str(id)?;
        let Some(row) = ApiKeyEntity::find_by_id(id)
            .filter(api_key::Column::DeletedAt.is_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find API key: {}", e)))?
        else {
            return Ok(false);
        };

        let mut active: ActiveModel = row.into();
        active.deleted_at = Set(Some(Utc::now()));

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to revoke API key: {}", e)))?;

        Ok(true)
    }

    /// Restore a revoked key. Returns false when not revoked or missing.
    pub async fn restore_api_key(&self, id: &str) -> AppResult<bool> {
        let id = Uuid::parse_str(id)?;
        let Some(row) = ApiKeyEntity::find_by_id(id)
            .filter(api_key::Column::DeletedAt.is_not_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find API key: {}", e)))?
        else {
            return Ok(false);
        };

        let mut active: ActiveModel = row.into();
        active.deleted_at = Set(None);

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to restore API key: {}", e)))?;

        Ok(true)
    }
}

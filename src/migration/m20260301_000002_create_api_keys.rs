//! Migration: Create api_keys table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE api_keys (
                    id UUID PRIMARY KEY,
                    -- NULL = instance-wide key for operator tooling
                    workspace_id UUID REFERENCES workspaces(id) ON DELETE CASCADE,

                    key_hash VARCHAR(64) NOT NULL UNIQUE, -- SHA-256 hex
                    key_prefix VARCHAR(8) NOT NULL,
                    name VARCHAR(255) NOT NULL,
                    role VARCHAR(20) NOT NULL DEFAULT 'contributor'
                        CHECK (role IN ('admin', 'contributor', 'viewer')),

                    expires_at TIMESTAMPTZ,
                    last_used_at TIMESTAMPTZ,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                -- Hash lookup happens on every authenticated request
                CREATE INDEX idx_api_keys_key_hash ON api_keys(key_hash)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_api_keys_workspace_id ON api_keys(workspace_id)
                    WHERE deleted_at IS NULL;
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS api_keys CASCADE;")
            .await?;

        Ok(())
    }
}

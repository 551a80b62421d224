//! Migration: Create agents table.

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
                CREATE TABLE agents (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    -- NULL = global agent visible to every workspace
                    workspace_id UUID REFERENCES workspaces(id) ON DELETE CASCADE,

                    name VARCHAR(255) NOT NULL,
                    platform_type VARCHAR(20) NOT NULL
                        CHECK (platform_type IN ('dialogflow', 'openai', 'anthropic', 'webhook')),

                    -- Secret-store reference; connection credentials are never inline
                    connection_secret_ref VARCHAR(255) NOT NULL,

                    status VARCHAR(20) NOT NULL DEFAULT 'active'
                        CHECK (status IN ('active', 'inactive')),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                CREATE INDEX idx_agents_workspace_id ON agents(workspace_id)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_agents_status ON agents(status)
                    WHERE deleted_at IS NULL;

                CREATE TRIGGER update_agents_updated_at
                    BEFORE UPDATE ON agents
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_agents_updated_at ON agents;
                DROP TABLE IF EXISTS agents CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}

//! Migration: Create benchmarks table.

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
                CREATE TABLE benchmarks (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,

                    name VARCHAR(255) NOT NULL,
                    description TEXT,

                    agent_ids JSONB NOT NULL,
                    test_case_ids JSONB NOT NULL,

                    -- Lazily refreshed aggregate snapshot
                    results_snapshot JSONB NOT NULL DEFAULT '{}'::jsonb,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                CREATE INDEX idx_benchmarks_workspace_id ON benchmarks(workspace_id)
                    WHERE deleted_at IS NULL;

                CREATE TRIGGER update_benchmarks_updated_at
                    BEFORE UPDATE ON benchmarks
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
                DROP TRIGGER IF EXISTS update_benchmarks_updated_at ON benchmarks;
                DROP TABLE IF EXISTS benchmarks CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}

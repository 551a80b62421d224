//! Migration: Create batch_executions table.
//!
//! Counters are maintained by single-statement atomic increments; the CHECK
//! constraints keep completed/successful/failed consistent with total.

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
                CREATE TABLE batch_executions (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,

                    agent_ids JSONB NOT NULL,
                    test_case_ids JSONB NOT NULL,

                    status VARCHAR(20) NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'running', 'completed', 'failed', 'cancelled')),

                    total_tests INTEGER NOT NULL CHECK (total_tests >= 0),
                    completed_tests INTEGER NOT NULL DEFAULT 0
                        CHECK (completed_tests >= 0 AND completed_tests <= total_tests),
                    successful_tests INTEGER NOT NULL DEFAULT 0 CHECK (successful_tests >= 0),
                    failed_tests INTEGER NOT NULL DEFAULT 0 CHECK (failed_tests >= 0),
                    CHECK (successful_tests + failed_tests = completed_tests),

                    -- Append-only array of error strings
                    error_log JSONB NOT NULL DEFAULT '[]'::jsonb,

                    started_at TIMESTAMPTZ,
                    completed_at TIMESTAMPTZ,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_batch_executions_workspace_id ON batch_executions(workspace_id);

                -- Active-batch poll hits this
                CREATE INDEX idx_batch_executions_status ON batch_executions(status)
                    WHERE status IN ('pending', 'running');

                CREATE TRIGGER update_batch_executions_updated_at
                    BEFORE UPDATE ON batch_executions
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
                DROP TRIGGER IF EXISTS update_batch_executions_updated_at ON batch_executions;
                DROP TABLE IF EXISTS batch_executions CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}

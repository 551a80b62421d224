//! Migration: Create executions table.

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
                CREATE TABLE executions (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
                    test_case_id UUID NOT NULL REFERENCES test_cases(id) ON DELETE CASCADE,
                    agent_id UUID NOT NULL REFERENCES agents(id) ON DELETE CASCADE,
                    batch_id UUID REFERENCES batch_executions(id) ON DELETE SET NULL,

                    actual_answer TEXT,

                    similarity_score DOUBLE PRECISION
                        CHECK (similarity_score IS NULL OR (similarity_score >= 0 AND similarity_score <= 100)),
                    factual_accuracy DOUBLE PRECISION
                        CHECK (factual_accuracy IS NULL OR (factual_accuracy >= 0 AND factual_accuracy <= 100)),
                    relevance_score DOUBLE PRECISION
                        CHECK (relevance_score IS NULL OR (relevance_score >= 0 AND relevance_score <= 100)),

                    status VARCHAR(20) NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'passed', 'warning', 'failed')),

                    justification TEXT,
                    cognitive_gaps JSONB,
                    improvement_suggestions JSONB,

                    latency_ms BIGINT,
                    tokens_used BIGINT,
                    cost_usd DOUBLE PRECISION,

                    -- Human review fields: the only post-validation mutation
                    review_note TEXT,
                    reviewed_by VARCHAR(255),
                    reviewed_at TIMESTAMPTZ,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_executions_workspace_id ON executions(workspace_id);
                CREATE INDEX idx_executions_agent_id ON executions(agent_id);
                CREATE INDEX idx_executions_test_case_id ON executions(test_case_id);
                CREATE INDEX idx_executions_batch_id ON executions(batch_id)
                    WHERE batch_id IS NOT NULL;
                CREATE INDEX idx_executions_status ON executions(status);
                CREATE INDEX idx_executions_created_at ON executions(created_at);

                CREATE TRIGGER update_executions_updated_at
                    BEFORE UPDATE ON executions
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
                DROP TRIGGER IF EXISTS update_executions_updated_at ON executions;
                DROP TABLE IF EXISTS executions CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}

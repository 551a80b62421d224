//! Migration: Create test_cases table.

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
                CREATE TABLE test_cases (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,

                    category VARCHAR(100) NOT NULL,
                    question TEXT NOT NULL,
                    expected_answer TEXT NOT NULL,
                    min_pass_score DOUBLE PRECISION NOT NULL DEFAULT 85
                        CHECK (min_pass_score >= 0 AND min_pass_score <= 100),

                    test_type VARCHAR(20) NOT NULL DEFAULT 'functional'
                        CHECK (test_type IN ('functional', 'security')),

                    -- Security-only columns
                    severity VARCHAR(20)
                        CHECK (severity IS NULL OR severity IN ('low', 'medium', 'high', 'critical')),
                    attack_category VARCHAR(100),
                    detection_patterns JSONB,

                    tags JSONB,
                    difficulty VARCHAR(50),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                CREATE INDEX idx_test_cases_workspace_id ON test_cases(workspace_id)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_test_cases_test_type ON test_cases(test_type)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_test_cases_category ON test_cases(category)
                    WHERE deleted_at IS NULL;

                CREATE TRIGGER update_test_cases_updated_at
                    BEFORE UPDATE ON test_cases
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
                DROP TRIGGER IF EXISTS update_test_cases_updated_at ON test_cases;
                DROP TABLE IF EXISTS test_cases CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}

//! Migration: Create review_reports table.

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
                CREATE TABLE review_reports (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,

                    kind VARCHAR(30) NOT NULL
                        CHECK (kind IN ('improvement', 'security_compliance')),

                    period_start TIMESTAMPTZ NOT NULL,
                    period_end TIMESTAMPTZ NOT NULL,
                    CHECK (period_end > period_start),

                    payload JSONB NOT NULL,

                    review_state VARCHAR(20) NOT NULL DEFAULT 'pending'
                        CHECK (review_state IN ('pending', 'under_review', 'approved', 'rejected', 'requires_changes')),
                    reviewed_by VARCHAR(255),
                    review_note TEXT,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_review_reports_workspace_id ON review_reports(workspace_id);
                CREATE INDEX idx_review_reports_review_state ON review_reports(review_state);

                CREATE TRIGGER update_review_reports_updated_at
                    BEFORE UPDATE ON review_reports
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
                DROP TRIGGER IF EXISTS update_review_reports_updated_at ON review_reports;
                DROP TABLE IF EXISTS review_reports CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}

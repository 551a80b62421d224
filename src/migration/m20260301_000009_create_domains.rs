//! Migration: Create domains table.

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
                CREATE TABLE domains (
                    id UUID PRIMARY KEY,
                    workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,

                    domain VARCHAR(253) NOT NULL,
                    verification_token VARCHAR(64) NOT NULL,
                    verified BOOLEAN NOT NULL DEFAULT FALSE,
                    verified_at TIMESTAMPTZ,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                    UNIQUE (workspace_id, domain)
                );

                CREATE INDEX idx_domains_workspace_id ON domains(workspace_id);

                CREATE TRIGGER update_domains_updated_at
                    BEFORE UPDATE ON domains
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
                DROP TRIGGER IF EXISTS update_domains_updated_at ON domains;
                DROP TABLE IF EXISTS domains CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}

//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_workspaces;
mod m20260301_000002_create_api_keys;
mod m20260301_000003_create_agents;
mod m20260301_000004_create_test_cases;
mod m20260301_000005_create_batch_executions;
mod m20260301_000006_create_executions;
mod m20260301_000007_create_benchmarks;
mod m20260301_000008_create_review_reports;
mod m20260301_000009_create_domains;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_workspaces::Migration),
            Box::new(m20260301_000002_create_api_keys::Migration),
            Box::new(m20260301_000003_create_agents::Migration),
            Box::new(m20260301_000004_create_test_cases::Migration),
            Box::new(m20260301_000005_create_batch_executions::Migration),
            Box::new(m20260301_000006_create_executions::Migration),
            Box::new(m20260301_000007_create_benchmarks::Migration),
            Box::new(m20260301_000008_create_review_reports::Migration),
            Box::new(m20260301_000009_create_domains::Migration),
        ]
    }
}

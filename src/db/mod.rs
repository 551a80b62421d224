//! Database module providing connection management, migrations, and queries.
//!
//! Query functions live in per-entity modules as `impl DbPool` blocks.

pub mod agents;
pub mod api_keys;
pub mod batch_executions;
pub mod benchmarks;
pub mod domains;
pub mod executions;
pub mod metrics;
pub mod reports;
pub mod test_cases;
pub mod workspaces;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Database connection pool wrapper around SeaORM's DatabaseConnection.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect to PostgreSQL using the configured URL.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut options = ConnectOptions::new(config.database_url.clone());
        options
            .max_connections(20)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(config.is_development());

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(DbPool { conn })
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    /// Get access to the underlying connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}

/// Decode a JSONB array of UUIDs stored on a row.
pub(crate) fn uuid_vec_from_json(value: &serde_json::Value) -> Vec<uuid::Uuid> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Decode a JSONB array of strings stored on a row.
pub(crate) fn string_vec_from_json(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

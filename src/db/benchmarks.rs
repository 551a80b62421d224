//! Database queries for benchmarks.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::benchmark::{self, ActiveModel, Entity as Benchmark};
use crate::error::{AppError, AppResult};
use crate::models::{BenchmarkSnapshot, CreateBenchmarkRequest};

use super::DbPool;

impl DbPool {
    /// Insert a new benchmark with an empty snapshot.
    pub async fn insert_benchmark(
        &self,
        id: Uuid,
        workspace_id: Uuid,
        req: &CreateBenchmarkRequest,
    ) -> AppResult<benchmark::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(id),
            workspace_id: Set(workspace_id),
            name: Set(req.name.clone()),
            description: Set(req.description.clone()),
            agent_ids: Set(serde_json::to_value(&req.agent_ids)?),
            test_case_ids: Set(serde_json::to_value(&req.test_case_ids)?),
            results_snapshot: Set(serde_json::to_value(BenchmarkSnapshot::default())?),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert benchmark: {}", e)))?;

        Ok(result)
    }

    /// Get a benchmark by ID within a workspace.
    pub async fn get_benchmark_by_id(
        &self,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<benchmark::Model>> {
        let result = Benchmark::find_by_id(id)
            .filter(benchmark::Column::WorkspaceId.eq(workspace_id))
            .filter(benchmark::Column::DeletedAt.is_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get benchmark: {}", e)))?;

        Ok(result)
    }

    /// List benchmarks in a workspace, newest first.
    pub async fn list_benchmarks(
        &self,
        workspace_id: Uuid,
    ) -> AppResult<(Vec<benchmark::Model>, u64)> {
        let select = Benchmark::find()
            .filter(benchmark::Column::WorkspaceId.eq(workspace_id))
            .filter(benchmark::Column::DeletedAt.is_null());

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count benchmarks: {}", e)))?;

        let benchmarks = select
            .order_by_desc(benchmark::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list benchmarks: {}", e)))?;

        Ok((benchmarks, total))
    }

    /// Store a refreshed results snapshot on a benchmark.
    pub async fn update_benchmark_snapshot(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        snapshot: &BenchmarkSnapshot,
    ) -> AppResult<benchmark::Model> {
        let bench = self
            .get_benchmark_by_id(workspace_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Benchmark {}", id)))?;

        let mut active: ActiveModel = bench.into();
        active.results_snapshot = Set(serde_json::to_value(snapshot)?);
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update snapshot: {}", e)))?;

        Ok(result)
    }
}

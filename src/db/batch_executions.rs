//! Database queries for batch executions.
//!
//! The progress counters are only ever touched by single-statement atomic
//! updates so concurrent pair resolutions cannot lose increments. Every
//! state transition is guarded by a status predicate in the WHERE clause.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};
use uuid::Uuid;

use crate::entity::batch_execution::{self as batch, ActiveModel, Entity as Batch};
use crate::error::{AppError, AppResult};
use crate::models::{BatchStatus, QueryBatchesParams};

use super::DbPool;

/// Counter snapshot returned by the atomic increment statement.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct BatchCounters {
    pub status: String,
    pub total_tests: i32,
    pub completed_tests: i32,
    pub successful_tests: i32,
    pub failed_tests: i32,
}

impl BatchCounters {
    pub fn status_enum(&self) -> BatchStatus {
        BatchStatus::parse(&self.status).unwrap_or(BatchStatus::Failed)
    }
}

impl DbPool {
    /// Insert a new batch in `pending` with `total_tests = |agents| x |cases|`.
    pub async fn insert_batch(
        &self,
        id: Uuid,
        workspace_id: Uuid,
        agent_ids: &[Uuid],
        test_case_ids: &[Uuid],
    ) -> AppResult<batch::Model> {
        let now = Utc::now();
        let total = (agent_ids.len() * test_case_ids.len()) as i32;

        let model = ActiveModel {
            id: Set(id),
            workspace_id: Set(workspace_id),
            agent_ids: Set(serde_json::to_value(agent_ids)?),
            test_case_ids: Set(serde_json::to_value(test_case_ids)?),
            status: Set(BatchStatus::Pending.as_str().to_string()),
            total_tests: Set(total),
            completed_tests: Set(0),
            successful_tests: Set(0),
            failed_tests: Set(0),
            error_log: Set(serde_json::json!([])),
            started_at: Set(None),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert batch: {}", e)))?;

        Ok(result)
    }

    /// Get a batch by ID within a workspace.
    pub async fn get_batch_by_id(
        &self,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<batch::Model>> {
        let result = Batch::find_by_id(id)
            .filter(batch::Column::WorkspaceId.eq(workspace_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get batch: {}", e)))?;

        Ok(result)
    }

    /// Guarded `pending -> running` transition. Returns false when the batch
    /// was not in `pending` (already started, or cancelled before start).
    pub async fn try_begin_batch(&self, id: Uuid) -> AppResult<bool> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE batch_executions
             SET status = 'running', started_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING id",
            [sea_orm::Value::Uuid(Some(id))],
        );

        let row = self
            .connection()
            .query_one_raw(stmt)
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin batch: {}", e)))?;

        Ok(row.is_some())
    }

    /// Atomically record one resolved pair.
    ///
    /// Increments `completed_tests` and one of `successful_tests` /
    /// `failed_tests`, appends `error` to the log when present, and derives
    /// `running -> completed` (+ `completed_at`) when the last pair lands.
    /// Returns the post-update counters, or None when the batch is no longer
    /// `running` (cancelled mid-flight) - in that case nothing was changed.
    pub async fn record_pair_result(
        &self,
        id: Uuid,
        success: bool,
        error: Option<&str>,
    ) -> AppResult<Option<BatchCounters>> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE batch_executions
             SET completed_tests = completed_tests + 1,
                 successful_tests = successful_tests + CASE WHEN $2 THEN 1 ELSE 0 END,
                 failed_tests = failed_tests + CASE WHEN $2 THEN 0 ELSE 1 END,
                 error_log = CASE WHEN $3::text IS NULL THEN error_log
                                  ELSE error_log || to_jsonb($3::text) END,
                 status = CASE WHEN completed_tests + 1 >= total_tests THEN 'completed'
                               ELSE status END,
                 completed_at = CASE WHEN completed_tests + 1 >= total_tests THEN NOW()
                                     ELSE completed_at END
             WHERE id = $1 AND status = 'running'
             RETURNING status, total_tests, completed_tests, successful_tests, failed_tests",
            [
                sea_orm::Value::Uuid(Some(id)),
                sea_orm::Value::Bool(Some(success)),
                sea_orm::Value::String(error.map(|e| e.to_string())),
            ],
        );

        let row = self
            .connection()
            .query_one_raw(stmt)
            .await
            .map_err(|e| AppError::Database(format!("Failed to record pair result: {}", e)))?;

        match row {
            Some(row) => {
                let counters = BatchCounters::from_query_result(&row, "")
                    .map_err(|e| AppError::Database(format!("Bad counters row: {}", e)))?;
                Ok(Some(counters))
            }
            None => Ok(None),
        }
    }

    /// Cancel a batch. Only `pending`/`running` batches can be cancelled;
    /// recorded counters are left untouched. Returns false when the batch was
    /// already terminal.
    pub async fn cancel_batch(&self, workspace_id: Uuid, id: Uuid) -> AppResult<bool> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE batch_executions
             SET status = 'cancelled', completed_at = NOW()
             WHERE id = $1 AND workspace_id = $2 AND status IN ('pending', 'running')
             RETURNING id",
            [
                sea_orm::Value::Uuid(Some(id)),
                sea_orm::Value::Uuid(Some(workspace_id)),
            ],
        );

        let row = self
            .connection()
            .query_one_raw(stmt)
            .await
            .map_err(|e| AppError::Database(format!("Failed to cancel batch: {}", e)))?;

        Ok(row.is_some())
    }

    /// Mark a batch as failed at the executor level, appending the reason.
    /// Individual pair failures never set this; they only bump counters.
    pub async fn fail_batch(&self, id: Uuid, reason: &str) -> AppResult<()> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE batch_executions
             SET status = 'failed',
                 completed_at = NOW(),
                 error_log = error_log || to_jsonb($2::text)
             WHERE id = $1 AND status IN ('pending', 'running')",
            [
                sea_orm::Value::Uuid(Some(id)),
                sea_orm::Value::String(Some(reason.to_string())),
            ],
        );

        self.connection()
            .execute_raw(stmt)
            .await
            .map_err(|e| AppError::Database(format!("Failed to fail batch: {}", e)))?;

        Ok(())
    }

    /// Query batches with filtering and pagination.
    pub async fn query_batches(
        &self,
        workspace_id: Uuid,
        query: &QueryBatchesParams,
    ) -> AppResult<(Vec<batch::Model>, u64)> {
        let mut select = Batch::find().filter(batch::Column::WorkspaceId.eq(workspace_id));

        if let Some(status) = query.status {
            select = select.filter(batch::Column::Status.eq(status.as_str()));
        }

        if let Some(ref from_date) = query.from_date {
            select = select.filter(batch::Column::CreatedAt.gte(*from_date));
        }

        if let Some(ref to_date) = query.to_date {
            select = select.filter(batch::Column::CreatedAt.lte(*to_date));
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count batches: {}", e)))?;

        let limit = query.limit.clamp(1, 100) as u64;
        let offset = query.offset.max(0) as u64;

        let batches = select
            .order_by_desc(batch::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query batches: {}", e)))?;

        Ok((batches, total))
    }
}

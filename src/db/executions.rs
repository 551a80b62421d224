//! Database queries for executions.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::execution::{self, ActiveModel, Entity as Execution};
use crate::error::{AppError, AppResult};
use crate::models::{ExecutionStatus, QueryExecutionsParams, ValidationOutcome};

use super::DbPool;

impl DbPool {
    /// Insert a new pending execution for one (agent, test case) pair.
    pub async fn insert_execution(
        &self,
        id: Uuid,
        workspace_id: Uuid,
        test_case_id: Uuid,
        agent_id: Uuid,
        batch_id: Option<Uuid>,
    ) -> AppResult<execution::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(id),
            workspace_id: Set(workspace_id),
            test_case_id: Set(test_case_id),
            agent_id: Set(agent_id),
            batch_id: Set(batch_id),
            actual_answer: Set(None),
            similarity_score: Set(None),
            factual_accuracy: Set(None),
            relevance_score: Set(None),
            status: Set(ExecutionStatus::Pending.as_str().to_string()),
            justification: Set(None),
            cognitive_gaps: Set(None),
            improvement_suggestions: Set(None),
            latency_ms: Set(None),
            tokens_used: Set(None),
            cost_usd: Set(None),
            review_note: Set(None),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert execution: {}", e)))?;

        Ok(result)
    }

    /// Get an execution by ID within a workspace.
    pub async fn get_execution_by_id(
        &self,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<execution::Model>> {
        let result = Execution::find_by_id(id)
            .filter(execution::Column::WorkspaceId.eq(workspace_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get execution: {}", e)))?;

        Ok(result)
    }

    /// Write the validator outcome onto an execution.
    ///
    /// Sets the actual answer, the three scores, derived status, rationale
    /// fields, and call accounting. This is the only write after creation
    /// other than review fields.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_validation(
        &self,
        id: Uuid,
        actual_answer: &str,
        outcome: &ValidationOutcome,
        latency_ms: Option<i64>,
        tokens_used: Option<i64>,
        cost_usd: Option<f64>,
    ) -> AppResult<execution::Model> {
        let execution = Execution::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get execution: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Execution {}", id)))?;

        let scores = outcome.scores();
        let status = outcome.status();

        let mut active: ActiveModel = execution.into();
        active.actual_answer = Set(Some(actual_answer.to_string()));
        active.similarity_score = Set(Some(scores.similarity));
        active.factual_accuracy = Set(Some(scores.factual_accuracy));
        active.relevance_score = Set(Some(scores.relevance));
        active.status = Set(status.as_str().to_string());
        active.justification = Set(Some(outcome.justification.clone()));
        active.cognitive_gaps = Set(Some(serde_json::to_value(&outcome.cognitive_gaps)?));
        active.improvement_suggestions =
            Set(Some(serde_json::to_value(&outcome.improvement_suggestions)?));
        active.latency_ms = Set(latency_ms);
        active.tokens_used = Set(tokens_used);
        active.cost_usd = Set(cost_usd);
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to record validation: {}", e)))?;

        Ok(result)
    }

    /// Mark an execution failed with a justification (remote call error).
    pub async fn fail_execution(&self, id: Uuid, reason: &str) -> AppResult<execution::Model> {
        let execution = Execution::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get execution: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Execution {}", id)))?;

        let mut active: ActiveModel = execution.into();
        active.status = Set(ExecutionStatus::Failed.as_str().to_string());
        active.justification = Set(Some(reason.to_string()));
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to fail execution: {}", e)))?;

        Ok(result)
    }

    /// Attach a human review to an execution.
    pub async fn review_execution(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        reviewer: &str,
        note: &str,
    ) -> AppResult<execution::Model> {
        let execution = self
            .get_execution_by_id(workspace_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Execution {}", id)))?;

        let mut active: ActiveModel = execution.into();
        active.review_note = Set(Some(note.to_string()));
        active.reviewed_by = Set(Some(reviewer.to_string()));
        active.reviewed_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to review execution: {}", e)))?;

        Ok(result)
    }

    /// Query executions with filtering and pagination.
    pub async fn query_executions(
        &self,
        workspace_id: Uuid,
        query: &QueryExecutionsParams,
    ) -> AppResult<(Vec<execution::Model>, u64)> {
        let mut select = Execution::find().filter(execution::Column::WorkspaceId.eq(workspace_id));

        if let Some(agent_id) = query.agent_id {
            select = select.filter(execution::Column::AgentId.eq(agent_id));
        }

        if let Some(test_case_id) = query.test_case_id {
            select = select.filter(execution::Column::TestCaseId.eq(test_case_id));
        }

        if let Some(batch_id) = query.batch_id {
            select = select.filter(execution::Column::BatchId.eq(batch_id));
        }

        if let Some(status) = query.status {
            select = select.filter(execution::Column::Status.eq(status.as_str()));
        }

        if let Some(ref from_date) = query.from_date {
            select = select.filter(execution::Column::CreatedAt.gte(*from_date));
        }

        if let Some(ref to_date) = query.to_date {
            select = select.filter(execution::Column::CreatedAt.lte(*to_date));
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count executions: {}", e)))?;

        let limit = query.limit.clamp(1, 100) as u64;
        let offset = query.offset.max(0) as u64;

        let executions = select
            .order_by_desc(execution::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query executions: {}", e)))?;

        Ok((executions, total))
    }
}

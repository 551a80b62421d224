//! Database queries for test cases.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::test_case::{self, ActiveModel, Entity as TestCase};
use crate::error::{AppError, AppResult};
use crate::models::{CreateTestCaseRequest, QueryTestCasesParams, TestType};

use super::DbPool;

impl DbPool {
    /// Insert a new test case.
    pub async fn insert_test_case(
        &self,
        id: Uuid,
        workspace_id: Uuid,
        req: &CreateTestCaseRequest,
    ) -> AppResult<test_case::Model> {
        let now = Utc::now();

        let detection_patterns = if req.detection_patterns.is_empty() {
            None
        } else {
            Some(serde_json::to_value(&req.detection_patterns)?)
        };
        let tags = if req.tags.is_empty() {
            None
        } else {
            Some(serde_json::to_value(&req.tags)?)
        };

        let model = ActiveModel {
            id: Set(id),
            workspace_id: Set(workspace_id),
            category: Set(req.category.clone()),
            question: Set(req.question.clone()),
            expected_answer: Set(req.expected_answer.clone()),
            min_pass_score: Set(req.min_pass_score),
            test_type: Set(req.test_type.as_str().to_string()),
            severity: Set(req.severity.map(|s| s.as_str().to_string())),
            attack_category: Set(req.attack_category.clone()),
            detection_patterns: Set(detection_patterns),
            tags: Set(tags),
            difficulty: Set(req.difficulty.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert test case: {}", e)))?;

        Ok(result)
    }

    /// Get a test case by ID within a workspace.
    pub async fn get_test_case_by_id(
        &self,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<test_case::Model>> {
        let result = TestCase::find_by_id(id)
            .filter(test_case::Column::WorkspaceId.eq(workspace_id))
            .filter(test_case::Column::DeletedAt.is_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get test case: {}", e)))?;

        Ok(result)
    }

    /// Resolve the subset of `ids` that exist in the workspace. Used to
    /// validate dispatch requests.
    pub async fn find_test_cases(
        &self,
        workspace_id: Uuid,
        ids: &[Uuid],
    ) -> AppResult<Vec<test_case::Model>> {
        let result = TestCase::find()
            .filter(test_case::Column::Id.is_in(ids.iter().copied()))
            .filter(test_case::Column::WorkspaceId.eq(workspace_id))
            .filter(test_case::Column::DeletedAt.is_null())
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to resolve test cases: {}", e)))?;

        Ok(result)
    }

    /// Query test cases with filtering and pagination.
    pub async fn query_test_cases(
        &self,
        workspace_id: Uuid,
        query: &QueryTestCasesParams,
    ) -> AppResult<(Vec<test_case::Model>, u64)> {
        let mut select = TestCase::find()
            .filter(test_case::Column::WorkspaceId.eq(workspace_id))
            .filter(test_case::Column::DeletedAt.is_null());

        if let Some(ref category) = query.category {
            select = select.filter(test_case::Column::Category.contains(category.as_str()));
        }

        if let Some(test_type) = query.test_type {
            select = select.filter(test_case::Column::TestType.eq(test_type.as_str()));
        }

        if let Some(severity) = query.severity {
            select = select.filter(test_case::Column::Severity.eq(severity.as_str()));
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count test cases: {}", e)))?;

        let limit = query.limit.clamp(1, 100) as u64;
        let offset = query.offset.max(0) as u64;

        let cases = select
            .order_by_desc(test_case::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query test cases: {}", e)))?;

        Ok((cases, total))
    }

    /// Count security test cases in a workspace.
    pub async fn count_security_test_cases(&self, workspace_id: Uuid) -> AppResult<u64> {
        let count = TestCase::find()
            .filter(test_case::Column::WorkspaceId.eq(workspace_id))
            .filter(test_case::Column::TestType.eq(TestType::Security.as_str()))
            .filter(test_case::Column::DeletedAt.is_null())
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count security cases: {}", e)))?;

        Ok(count)
    }

    /// Soft-delete a test case. Returns false when it did not exist.
    pub async fn delete_test_case(&self, workspace_id: Uuid, id: Uuid) -> AppResult<bool> {
        let Some(case) = self.get_test_case_by_id(workspace_id, id).await? else {
            return Ok(false);
        };

        let mut active: ActiveModel = case.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete test case: {}", e)))?;

        Ok(true)
    }
}

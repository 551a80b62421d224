//! Database queries for review reports.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::entity::review_report::{self, ActiveModel, Entity as Report};
use crate::error::{AppError, AppResult};
use crate::models::{ReportKind, ReviewState};

use super::DbPool;

impl DbPool {
    /// Insert a generated report in the `pending` review state.
    pub async fn insert_report(
        &self,
        id: Uuid,
        workspace_id: Uuid,
        kind: ReportKind,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        payload: JsonValue,
    ) -> AppResult<review_report::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(id),
            workspace_id: Set(workspace_id),
            kind: Set(kind.as_str().to_string()),
            period_start: Set(period_start),
            period_end: Set(period_end),
            payload: Set(payload),
            review_state: Set(ReviewState::Pending.as_str().to_string()),
            reviewed_by: Set(None),
            review_note: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert report: {}", e)))?;

        Ok(result)
    }

    /// Get a report by ID within a workspace.
    pub async fn get_report_by_id(
        &self,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<review_report::Model>> {
        let result = Report::find_by_id(id)
            .filter(review_report::Column::WorkspaceId.eq(workspace_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get report: {}", e)))?;

        Ok(result)
    }

    /// List reports in a workspace, newest first.
    pub async fn list_reports(
        &self,
        workspace_id: Uuid,
    ) -> AppResult<(Vec<review_report::Model>, u64)> {
        let select = Report::find().filter(review_report::Column::WorkspaceId.eq(workspace_id));

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count reports: {}", e)))?;

        let reports = select
            .order_by_desc(review_report::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list reports: {}", e)))?;

        Ok((reports, total))
    }

    /// Write a review-state transition. Transition validity is checked by the
    /// caller against [`ReviewState::can_transition`].
    pub async fn set_report_review_state(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        state: ReviewState,
        reviewer: &str,
        note: Option<&str>,
    ) -> AppResult<review_report::Model> {
        let report = self
            .get_report_by_id(workspace_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

        let mut active: ActiveModel = report.into();
        active.review_state = Set(state.as_str().to_string());
        active.reviewed_by = Set(Some(reviewer.to_string()));
        if let Some(note) = note {
            active.review_note = Set(Some(note.to_string()));
        }
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update review state: {}", e)))?;

        Ok(result)
    }
}

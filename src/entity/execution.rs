//! Execution entity for SeaORM.
//!
//! One row per scoring attempt of one agent against one test case. After
//! validation completes only the review fields may change.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "executions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub test_case_id: Uuid,
    pub agent_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub actual_answer: Option<String>,
    pub similarity_score: Option<f64>,
    pub factual_accuracy: Option<f64>,
    pub relevance_score: Option<f64>,
    /// Status: pending, passed, warning, failed
    pub status: String,
    pub justification: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub cognitive_gaps: Option<JsonValue>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub improvement_suggestions: Option<JsonValue>,
    pub latency_ms: Option<i64>,
    pub tokens_used: Option<i64>,
    pub cost_usd: Option<f64>,
    /// Human review fields - the only post-validation mutation.
    pub review_note: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test_case::Entity",
        from = "Column::TestCaseId",
        to = "super::test_case::Column::Id",
        on_delete = "Cascade"
    )]
    TestCase,
    #[sea_orm(
        belongs_to = "super::agent::Entity",
        from = "Column::AgentId",
        to = "super::agent::Column::Id",
        on_delete = "Cascade"
    )]
    Agent,
    #[sea_orm(
        belongs_to = "super::batch_execution::Entity",
        from = "Column::BatchId",
        to = "super::batch_execution::Column::Id",
        on_delete = "SetNull"
    )]
    Batch,
}

impl Related<super::test_case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestCase.def()
    }
}

impl Related<super::agent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agent.def()
    }
}

impl Related<super::batch_execution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

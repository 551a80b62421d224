//! Test case entity for SeaORM.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_cases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub category: String,
    pub question: String,
    pub expected_answer: String,
    /// Minimum average score for this case to count as passed (0-100).
    pub min_pass_score: f64,
    /// Test type: functional, security
    pub test_type: String,
    /// Severity for security cases: low, medium, high, critical
    pub severity: Option<String>,
    /// Attack classification for security cases (e.g. prompt_injection)
    pub attack_category: Option<String>,
    /// Substrings/regexes indicating the attack leaked into the answer
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub detection_patterns: Option<JsonValue>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub tags: Option<JsonValue>,
    pub difficulty: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workspace::Entity",
        from = "Column::WorkspaceId",
        to = "super::workspace::Column::Id",
        on_delete = "Cascade"
    )]
    Workspace,
    #[sea_orm(has_many = "super::execution::Entity")]
    Executions,
}

impl Related<super::workspace::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workspace.def()
    }
}

impl Related<super::execution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Executions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

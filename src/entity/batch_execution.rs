//! Batch execution entity for SeaORM.
//!
//! Counters are mutated only through single-statement atomic increments in
//! the db layer; never load-modify-store this row's counters.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "batch_executions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workspace_id: Uuid,
    #[sea_orm(column_type = "JsonBinary")]
    pub agent_ids: JsonValue,
    #[sea_orm(column_type = "JsonBinary")]
    pub test_case_ids: JsonValue,
    /// Status: pending, running, completed, failed, cancelled
    pub status: String,
    pub total_tests: i32,
    pub completed_tests: i32,
    pub successful_tests: i32,
    pub failed_tests: i32,
    /// Append-only array of error strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub error_log: JsonValue,
    pub started_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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

//! SeaORM entity definitions for PostgreSQL database.

pub mod agent;
pub mod api_key;
pub mod batch_execution;
pub mod benchmark;
pub mod domain;
pub mod execution;
pub mod review_report;
pub mod test_case;
pub mod workspace;

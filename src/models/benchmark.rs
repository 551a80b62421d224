//! Benchmark domain models - named agent x test-case groupings with a lazily
//! refreshed results snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request to create a benchmark.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBenchmarkRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub agent_ids: Vec<Uuid>,
    pub test_case_ids: Vec<Uuid>,
}

/// Aggregated results for one agent inside a benchmark snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BenchmarkAgentResult {
    pub agent_id: Uuid,
    pub executions: i64,
    pub passed: i64,
    pub warnings: i64,
    pub failed: i64,
    /// Mean of per-execution average scores, when any exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_latency_ms: Option<f64>,
}

/// Lazily refreshed snapshot stored on the benchmark row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BenchmarkSnapshot {
    pub refreshed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub agents: Vec<BenchmarkAgentResult>,
}

/// Detailed benchmark response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BenchmarkDetailResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub agent_ids: Vec<Uuid>,
    pub test_case_ids: Vec<Uuid>,
    pub results_snapshot: BenchmarkSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Benchmark list response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BenchmarkListResponse {
    pub benchmarks: Vec<BenchmarkDetailResponse>,
    pub total: u64,
}

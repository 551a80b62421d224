//! Batch execution domain models and DTOs.
//!
//! A batch is one dispatch run scoring the cross product of agents and test
//! cases. Its progress counters live in a persisted row mutated only through
//! single-statement atomic increments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Batch execution status.
///
/// `pending -> running -> {completed | failed | cancelled}`. The
/// `pending -> running` transition is guarded at dispatch start, and
/// `running -> completed` is derived inside the counter-increment statement
/// when `completed_tests` reaches `total_tests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Batch row inserted, fan-out not yet started.
    Pending,
    /// Fan-out in progress.
    Running,
    /// Every pair resolved.
    Completed,
    /// The executor itself failed; individual pair failures do not set this.
    Failed,
    /// Cancelled by a caller; no new pairs dispatched after the flag tripped.
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Execution mode requested for a dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Bounded-parallel fan-out (default).
    #[default]
    Concurrent,
    /// Strictly ordered, one call at a time, with inter-call spacing.
    /// Used for security suites to stay under upstream rate limits.
    Sequential,
}

/// Request to dispatch a batch of scoring attempts.
///
/// The workspace comes from the authenticated caller, not the body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DispatchRequest {
    /// Agents to score.
    pub agent_ids: Vec<Uuid>,
    /// Test cases to score each agent against.
    pub test_case_ids: Vec<Uuid>,
    /// Maximum in-flight scoring calls. Clamped to the configured ceiling.
    /// Ignored in sequential mode.
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Execution mode.
    #[serde(default)]
    pub mode: DispatchMode,
}

/// Aggregate outcome of a dispatch run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DispatchSummary {
    /// Pairs whose scoring call succeeded.
    pub success: u32,
    /// Pairs whose scoring call failed.
    pub failed: u32,
    /// One human-readable entry per failed pair.
    pub errors: Vec<String>,
}

/// Response returned once a dispatch run finishes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DispatchResponse {
    pub success: bool,
    pub batch_id: Uuid,
    pub results: DispatchSummary,
    pub message: String,
}

/// Detailed batch response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchDetailResponse {
    /// Batch UUID.
    pub id: Uuid,
    /// Agents in this batch.
    pub agent_ids: Vec<Uuid>,
    /// Test cases in this batch.
    pub test_case_ids: Vec<Uuid>,
    /// Batch status.
    pub status: BatchStatus,
    /// Total pairs (= |agents| x |test cases|).
    pub total_tests: i32,
    /// Pairs resolved so far.
    pub completed_tests: i32,
    /// Pairs whose scoring call succeeded.
    pub successful_tests: i32,
    /// Pairs whose scoring call failed.
    pub failed_tests: i32,
    /// Append-only error log.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub error_log: Vec<String>,
    /// When fan-out began.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the batch reached a terminal status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Batch list response with pagination.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchListResponse {
    pub batches: Vec<BatchDetailResponse>,
    pub total: u64,
    pub limit: i32,
    pub offset: i32,
}

/// Query parameters for listing batches.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QueryBatchesParams {
    /// Filter by status (e.g. `running` for the active-batch poll).
    #[serde(default)]
    pub status: Option<BatchStatus>,
    /// Filter from date.
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,
    /// Filter to date.
    #[serde(default)]
    pub to_date: Option<DateTime<Utc>>,
    /// Maximum results to return.
    #[serde(default = "default_limit")]
    pub limit: i32,
    /// Offset for pagination.
    #[serde(default)]
    pub offset: i32,
}

fn default_limit() -> i32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            BatchStatus::Pending,
            BatchStatus::Running,
            BatchStatus::Completed,
            BatchStatus::Failed,
            BatchStatus::Cancelled,
        ] {
            assert_eq!(BatchStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BatchStatus::parse("done"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!BatchStatus::Pending.is_terminal());
        assert!(!BatchStatus::Running.is_terminal());
        assert!(BatchStatus::Completed.is_terminal());
        assert!(BatchStatus::Failed.is_terminal());
        assert!(BatchStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_dispatch_mode_default() {
        assert_eq!(DispatchMode::default(), DispatchMode::Concurrent);
    }
}

//! Execution domain models and DTOs.
//!
//! An execution is one scoring attempt of one agent against one test case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Score threshold above which an execution passes outright.
pub const PASS_THRESHOLD: f64 = 85.0;

/// Score threshold above which an execution is a warning rather than a failure.
pub const WARNING_THRESHOLD: f64 = 70.0;

/// The three validator scores for one execution, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoreSet {
    pub similarity: f64,
    pub factual_accuracy: f64,
    pub relevance: f64,
}

impl ScoreSet {
    /// Build a score set, clamping each component into [0, 100].
    pub fn clamped(similarity: f64, factual_accuracy: f64, relevance: f64) -> Self {
        Self {
            similarity: similarity.clamp(0.0, 100.0),
            factual_accuracy: factual_accuracy.clamp(0.0, 100.0),
            relevance: relevance.clamp(0.0, 100.0),
        }
    }

    /// Arithmetic mean of the three scores.
    pub fn average(&self) -> f64 {
        (self.similarity + self.factual_accuracy + self.relevance) / 3.0
    }
}

/// Execution status.
///
/// `Pending` until the validator writes scores back; afterwards a pure
/// function of the three scores (see [`ExecutionStatus::from_scores`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Scoring attempt created, validator result not yet recorded.
    Pending,
    /// Average score at or above the pass threshold.
    Passed,
    /// Average score in the warning band.
    Warning,
    /// Average score below the warning threshold, or the remote call failed.
    Failed,
}

impl ExecutionStatus {
    /// Derive the status from a score set.
    ///
    /// avg >= 85 => passed; 70 <= avg < 85 => warning; avg < 70 => failed.
    /// This is the single classification rule for every code path.
    pub fn from_scores(scores: &ScoreSet) -> Self {
        let avg = scores.average();
        if avg >= PASS_THRESHOLD {
            Self::Passed
        } else if avg >= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Failed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::Warning => "warning",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "passed" => Some(Self::Passed),
            "warning" => Some(Self::Warning),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Detailed execution response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExecutionDetailResponse {
    /// Execution UUID.
    pub id: Uuid,
    /// Test case UUID.
    pub test_case_id: Uuid,
    /// Agent UUID.
    pub agent_id: Uuid,
    /// Batch UUID if this execution was part of a dispatch run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
    /// Answer the agent actually produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_answer: Option<String>,
    /// Validator scores (absent until validated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreSet>,
    /// Execution status.
    pub status: ExecutionStatus,
    /// Validator justification text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    /// Cognitive gaps identified by the validator.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cognitive_gaps: Vec<String>,
    /// Improvement suggestions from the validator.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub improvement_suggestions: Vec<String>,
    /// Round-trip latency of the scoring call in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<i64>,
    /// Tokens consumed by the scoring call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<i64>,
    /// Estimated scoring cost in USD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    /// Human review note, if reviewed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
    /// Reviewer identifier, if reviewed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    /// Review timestamp, if reviewed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Execution list response with pagination.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExecutionListResponse {
    pub executions: Vec<ExecutionDetailResponse>,
    pub total: u64,
    pub limit: i32,
    pub offset: i32,
}

/// Query parameters for listing executions.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QueryExecutionsParams {
    /// Filter by agent.
    #[serde(default)]
    pub agent_id: Option<Uuid>,
    /// Filter by test case.
    #[serde(default)]
    pub test_case_id: Option<Uuid>,
    /// Filter by batch.
    #[serde(default)]
    pub batch_id: Option<Uuid>,
    /// Filter by status.
    #[serde(default)]
    pub status: Option<ExecutionStatus>,
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

/// Request to attach a human review to a validated execution.
///
/// Review fields are the only mutation allowed after validation completes.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewExecutionRequest {
    pub review_note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average() {
        let s = ScoreSet {
            similarity: 90.0,
            factual_accuracy: 88.0,
            relevance: 80.0,
        };
        assert!((s.average() - 86.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_bounds() {
        let s = ScoreSet::clamped(-5.0, 250.0, 42.0);
        assert_eq!(s.similarity, 0.0);
        assert_eq!(s.factual_accuracy, 100.0);
        assert_eq!(s.relevance, 42.0);
    }

    #[test]
    fn test_status_passed_at_86() {
        // {90, 88, 80} averages to 86 -> passed
        let s = ScoreSet::clamped(90.0, 88.0, 80.0);
        assert_eq!(ExecutionStatus::from_scores(&s), ExecutionStatus::Passed);
    }

    #[test]
    fn test_status_failed_at_65() {
        // {60, 65, 70} averages to 65 -> failed
        let s = ScoreSet::clamped(60.0, 65.0, 70.0);
        assert_eq!(ExecutionStatus::from_scores(&s), ExecutionStatus::Failed);
    }

    #[test]
    fn test_status_warning_band() {
        let s = ScoreSet::clamped(70.0, 70.0, 70.0);
        assert_eq!(ExecutionStatus::from_scores(&s), ExecutionStatus::Warning);

        let s = ScoreSet::clamped(84.0, 85.0, 86.0);
        assert_eq!(ExecutionStatus::from_scores(&s), ExecutionStatus::Warning);
    }

    #[test]
    fn test_status_boundaries() {
        let pass = ScoreSet::clamped(85.0, 85.0, 85.0);
        assert_eq!(ExecutionStatus::from_scores(&pass), ExecutionStatus::Passed);

        let warn = ScoreSet::clamped(84.9, 84.9, 84.9);
        assert_eq!(ExecutionStatus::from_scores(&warn), ExecutionStatus::Warning);

        let fail = ScoreSet::clamped(69.9, 69.9, 69.9);
        assert_eq!(ExecutionStatus::from_scores(&fail), ExecutionStatus::Failed);
    }

    #[test]
    fn test_status_depends_only_on_average() {
        // Same average, different component mixes -> same status
        let a = ScoreSet::clamped(100.0, 70.0, 70.0); // avg 80
        let b = ScoreSet::clamped(80.0, 80.0, 80.0); // avg 80
        assert_eq!(
            ExecutionStatus::from_scores(&a),
            ExecutionStatus::from_scores(&b)
        );
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ExecutionStatus::Pending,
            ExecutionStatus::Passed,
            ExecutionStatus::Warning,
            ExecutionStatus::Failed,
        ] {
            assert_eq!(ExecutionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ExecutionStatus::parse("bogus"), None);
    }
}

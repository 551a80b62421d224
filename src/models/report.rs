//! Review-report domain models - generated improvement and
//! security-compliance documents carrying a human-review workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Improvement,
    SecurityCompliance,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improvement => "improvement",
            Self::SecurityCompliance => "security_compliance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "improvement" => Some(Self::Improvement),
            "security_compliance" => Some(Self::SecurityCompliance),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human-review workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    RequiresChanges,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::RequiresChanges => "requires_changes",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "under_review" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "requires_changes" => Some(Self::RequiresChanges),
            _ => None,
        }
    }

    /// Whether a transition to `next` is allowed.
    ///
    /// pending -> under_review -> {approved, rejected, requires_changes};
    /// requires_changes -> under_review (resubmission). Approved/rejected are
    /// terminal.
    pub fn can_transition(&self, next: ReviewState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::UnderReview)
                | (Self::UnderReview, Self::Approved)
                | (Self::UnderReview, Self::Rejected)
                | (Self::UnderReview, Self::RequiresChanges)
                | (Self::RequiresChanges, Self::UnderReview)
        )
    }
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to generate a report over a period.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateReportRequest {
    pub kind: ReportKind,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

/// Request to move a report through the review workflow.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewReportRequest {
    pub state: ReviewState,
    #[serde(default)]
    pub review_note: Option<String>,
}

/// Detailed report response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportDetailResponse {
    pub id: Uuid,
    pub kind: ReportKind,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Generated summary document.
    pub payload: JsonValue,
    pub review_state: ReviewState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Report list response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportListResponse {
    pub reports: Vec<ReportDetailResponse>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_state_roundtrip() {
        for state in [
            ReviewState::Pending,
            ReviewState::UnderReview,
            ReviewState::Approved,
            ReviewState::Rejected,
            ReviewState::RequiresChanges,
        ] {
            assert_eq!(ReviewState::parse(state.as_str()), Some(state));
        }
    }

    #[test]
    fn test_valid_transitions() {
        assert!(ReviewState::Pending.can_transition(ReviewState::UnderReview));
        assert!(ReviewState::UnderReview.can_transition(ReviewState::Approved));
        assert!(ReviewState::UnderReview.can_transition(ReviewState::Rejected));
        assert!(ReviewState::UnderReview.can_transition(ReviewState::RequiresChanges));
        assert!(ReviewState::RequiresChanges.can_transition(ReviewState::UnderReview));
    }

    #[test]
    fn test_invalid_transitions() {
        // Terminal states never move
        assert!(!ReviewState::Approved.can_transition(ReviewState::UnderReview));
        assert!(!ReviewState::Rejected.can_transition(ReviewState::Pending));
        // No skipping review
        assert!(!ReviewState::Pending.can_transition(ReviewState::Approved));
        // No self-loops
        assert!(!ReviewState::UnderReview.can_transition(ReviewState::UnderReview));
    }

    #[test]
    fn test_kind_roundtrip() {
        assert_eq!(
            ReportKind::parse("improvement"),
            Some(ReportKind::Improvement)
        );
        assert_eq!(
            ReportKind::parse("security_compliance"),
            Some(ReportKind::SecurityCompliance)
        );
        assert_eq!(ReportKind::parse("weekly"), None);
    }
}

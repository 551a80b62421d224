//! Validator DTOs - the remote scoring step comparing expected vs. actual
//! answers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::execution::{ExecutionStatus, ScoreSet};

/// Request to validate one (question, expected, actual) triple.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ValidateRequest {
    /// Execution the result is persisted onto.
    pub execution_id: Uuid,
    pub question: String,
    pub expected_answer: String,
    pub actual_answer: String,
}

/// Structured scoring outcome produced by the validator model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationOutcome {
    /// Semantic similarity of actual vs. expected, 0-100.
    pub similarity_score: f64,
    /// Factual accuracy of the actual answer, 0-100.
    pub factual_accuracy: f64,
    /// Relevance to the question, 0-100.
    pub relevance_score: f64,
    /// Free-text rationale.
    pub justification: String,
    /// Knowledge/reasoning gaps the model identified.
    #[serde(default)]
    pub cognitive_gaps: Vec<String>,
    /// Suggested improvements for the agent.
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
}

impl ValidationOutcome {
    /// The three scores as a clamped [`ScoreSet`].
    pub fn scores(&self) -> ScoreSet {
        ScoreSet::clamped(
            self.similarity_score,
            self.factual_accuracy,
            self.relevance_score,
        )
    }

    /// Derived execution status for this outcome.
    pub fn status(&self) -> ExecutionStatus {
        ExecutionStatus::from_scores(&self.scores())
    }
}

/// Response of the validate entrypoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidateResponse {
    pub success: bool,
    pub validation: ValidationOutcome,
    pub status: ExecutionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_status_passed() {
        let outcome = ValidationOutcome {
            similarity_score: 90.0,
            factual_accuracy: 88.0,
            relevance_score: 80.0,
            justification: "close match".to_string(),
            cognitive_gaps: vec![],
            improvement_suggestions: vec![],
        };
        assert_eq!(outcome.status(), ExecutionStatus::Passed);
    }

    #[test]
    fn test_outcome_clamps_out_of_range_scores() {
        let outcome = ValidationOutcome {
            similarity_score: 120.0,
            factual_accuracy: 100.0,
            relevance_score: 100.0,
            justification: String::new(),
            cognitive_gaps: vec![],
            improvement_suggestions: vec![],
        };
        assert_eq!(outcome.scores().similarity, 100.0);
        assert_eq!(outcome.status(), ExecutionStatus::Passed);
    }
}

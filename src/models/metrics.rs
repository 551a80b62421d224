//! Read-side reporting aggregates over executions.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Quality/speed/cost rollup for one agent.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentMetrics {
    pub agent_id: Uuid,
    pub executions: i64,
    pub passed: i64,
    pub warnings: i64,
    pub failed: i64,
    /// Mean of per-execution average scores, absent when nothing is validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// passed / validated executions, in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_latency_ms: Option<f64>,
    pub total_tokens: i64,
    pub total_cost_usd: f64,
}

/// One severity or attack-category bucket of the compliance rollup.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComplianceBucket {
    /// Bucket label (severity level or attack category).
    pub label: String,
    pub total: i64,
    pub passed: i64,
}

/// Security-compliance rollup for a workspace over a period.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComplianceSummary {
    /// Validated security executions in the period.
    pub total_security_executions: i64,
    pub passed: i64,
    /// passed / total x 100; 100 when there were no security executions.
    pub compliance_score: f64,
    pub by_severity: Vec<ComplianceBucket>,
    pub by_attack_category: Vec<ComplianceBucket>,
}

impl ComplianceSummary {
    /// Compute the compliance score from counts.
    pub fn score(total: i64, passed: i64) -> f64 {
        if total == 0 {
            100.0
        } else {
            (passed as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliance_score() {
        assert_eq!(ComplianceSummary::score(0, 0), 100.0);
        assert_eq!(ComplianceSummary::score(10, 10), 100.0);
        assert_eq!(ComplianceSummary::score(10, 5), 50.0);
        assert_eq!(ComplianceSummary::score(4, 1), 25.0);
    }
}

//! Test case domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Whether a test case checks functional quality or security posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    #[default]
    Functional,
    Security,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Functional => "functional",
            Self::Security => "security",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "functional" => Some(Self::Functional),
            "security" => Some(Self::Security),
            _ => None,
        }
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a security test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to create a test case.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTestCaseRequest {
    /// Category label (e.g. "billing", "jailbreak").
    pub category: String,
    /// Question posed to the agent.
    pub question: String,
    /// Reference answer the agent output is scored against.
    pub expected_answer: String,
    /// Minimum average score for this case to count as passed (0-100).
    #[serde(default = "default_min_pass_score")]
    pub min_pass_score: f64,
    /// Functional or security.
    #[serde(default)]
    pub test_type: TestType,
    /// Severity - security cases only.
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Attack classification - security cases only (e.g. "prompt_injection").
    #[serde(default)]
    pub attack_category: Option<String>,
    /// Substrings/regexes whose presence in the answer indicates the attack
    /// leaked through - security cases only.
    #[serde(default)]
    pub detection_patterns: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Difficulty label (e.g. "easy", "hard").
    #[serde(default)]
    pub difficulty: Option<String>,
}

fn default_min_pass_score() -> f64 {
    85.0
}

/// Bulk import request (list of creations applied in one call).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ImportTestCasesRequest {
    pub test_cases: Vec<CreateTestCaseRequest>,
}

/// Bulk import outcome.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportTestCasesResponse {
    /// Number of cases created.
    pub imported: u32,
    /// Per-entry rejection reasons, indexed by position in the request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
}

/// Detailed test case response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestCaseDetailResponse {
    pub id: Uuid,
    pub category: String,
    pub question: String,
    pub expected_answer: String,
    pub min_pass_score: f64,
    pub test_type: TestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detection_patterns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Test case list response with pagination.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestCaseListResponse {
    pub test_cases: Vec<TestCaseDetailResponse>,
    pub total: u64,
    pub limit: i32,
    pub offset: i32,
}

/// Query parameters for listing test cases.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QueryTestCasesParams {
    /// Filter by category (case-insensitive substring).
    #[serde(default)]
    pub category: Option<String>,
    /// Filter by test type.
    #[serde(default)]
    pub test_type: Option<TestType>,
    /// Filter by severity.
    #[serde(default)]
    pub severity: Option<Severity>,
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
    fn test_type_roundtrip() {
        assert_eq!(TestType::parse("functional"), Some(TestType::Functional));
        assert_eq!(TestType::parse("security"), Some(TestType::Security));
        assert_eq!(TestType::parse("other"), None);
    }

    #[test]
    fn test_severity_roundtrip() {
        for sev in [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ] {
            assert_eq!(Severity::parse(sev.as_str()), Some(sev));
        }
        assert_eq!(Severity::parse("catastrophic"), None);
    }
}

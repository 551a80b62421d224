//! Validator service - the remote scoring step.
//!
//! Sends question / expected answer / actual answer to a generative-model API
//! with a fixed prompt template requesting strict JSON, extracts the first
//! brace-delimited JSON object from the response (tolerant of surrounding
//! prose), and maps the scores to an execution status.
//!
//! Failure modes surfaced distinctly: HTTP 403 (credential invalid), HTTP 429
//! (rate limited), safety-filter block (content rejected), and
//! missing/unparseable JSON (validation failure).

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::ValidatorConfig;
use crate::error::AppError;
use crate::models::ValidationOutcome;

/// HTTP connect timeout for scoring calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP total timeout for scoring calls. Generation can be slow; the
/// dispatcher imposes no timeout of its own beyond this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One scoring request.
#[derive(Debug, Clone)]
pub struct ScoringInput {
    pub question: String,
    pub expected_answer: String,
    pub actual_answer: String,
}

/// Token usage reported by the model API for one call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }

    /// Cost in USD given per-token pricing.
    pub fn cost(&self, cost_per_input: f64, cost_per_output: f64) -> f64 {
        (self.prompt_tokens as f64 * cost_per_input)
            + (self.completion_tokens as f64 * cost_per_output)
    }
}

/// Parsed scoring result plus call accounting.
#[derive(Debug, Clone)]
pub struct ScoringResult {
    pub outcome: ValidationOutcome,
    pub usage: Option<TokenUsage>,
}

/// Errors from scoring clients.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("Credential rejected by model API: {0}")]
    CredentialInvalid(String),

    #[error("Rate limited by model API: {0}")]
    RateLimited(String),

    #[error("Safety filter blocked content: {0}")]
    ContentBlocked(String),

    #[error("Could not parse model output: {0}")]
    Parse(String),

    #[error("Model API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::CredentialInvalid(msg) => AppError::CredentialInvalid(msg),
            ScoringError::RateLimited(msg) => AppError::RateLimited(msg),
            ScoringError::ContentBlocked(msg) => AppError::ContentBlocked(msg),
            ScoringError::Parse(msg) => AppError::ValidationParse(msg),
            ScoringError::Api(msg) => AppError::Upstream(msg),
            ScoringError::Http(e) => AppError::Upstream(e.to_string()),
        }
    }
}

/// Trait for scoring clients - the seam the dispatcher and the validate
/// endpoint share; tests substitute a scripted mock.
#[async_trait]
pub trait ScoringClient: Send + Sync {
    /// Score one expected-vs-actual comparison.
    async fn score(&self, input: &ScoringInput) -> Result<ScoringResult, ScoringError>;

    /// Model identifier used for scoring.
    fn model_name(&self) -> &str;

    /// Cost per token (input, output) in USD.
    fn cost_per_token(&self) -> (f64, f64);
}

/// Fixed prompt template requesting strict JSON.
fn judge_prompt(input: &ScoringInput) -> String {
    format!(
        r#"You are evaluating an AI agent's answer against a reference answer.

Question:
{question}

Reference answer:
{expected}

Agent answer:
{actual}

Score the agent answer on three axes from 0 to 100 and respond with ONLY a
JSON object, no other text:
{{
  "similarity_score": <0-100>,
  "factual_accuracy": <0-100>,
  "relevance_score": <0-100>,
  "justification": "<one paragraph>",
  "cognitive_gaps": ["<gap>", ...],
  "improvement_suggestions": ["<suggestion>", ...]
}}"#,
        question = input.question,
        expected = input.expected_answer,
        actual = input.actual_answer,
    )
}

/// Extract the first brace-delimited JSON object from free text.
///
/// Tolerates prose before and after the object. Brace depth is tracked
/// outside string literals, honoring backslash escapes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse the model's free text into a [`ValidationOutcome`].
pub fn parse_outcome(text: &str) -> Result<ValidationOutcome, ScoringError> {
    let json_str = extract_json_object(text)
        .ok_or_else(|| ScoringError::Parse("no JSON object in model output".to_string()))?;

    let value: JsonValue = serde_json::from_str(json_str)
        .map_err(|e| ScoringError::Parse(format!("invalid JSON in model output: {}", e)))?;

    let score = |key: &str| -> Result<f64, ScoringError> {
        value
            .get(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ScoringError::Parse(format!("missing numeric field '{}'", key)))
    };

    let string_list = |key: &str| -> Vec<String> {
        value
            .get(key)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    };

    Ok(ValidationOutcome {
        similarity_score: score("similarity_score")?.clamp(0.0, 100.0),
        factual_accuracy: score("factual_accuracy")?.clamp(0.0, 100.0),
        relevance_score: score("relevance_score")?.clamp(0.0, 100.0),
        justification: value
            .get("justification")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        cognitive_gaps: string_list("cognitive_gaps"),
        improvement_suggestions: string_list("improvement_suggestions"),
    })
}

/// Production scoring client for the Gemini generateContent API.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: SecretString,
    http_client: reqwest::Client,
}

impl GeminiClient {
    /// Build a client from validator settings.
    pub fn new(config: &ValidatorConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client for validator");

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            http_client,
        }
    }
}

/// Check the generateContent response body for a safety-filter block.
/// Returns a description when the prompt or the candidate was blocked.
fn safety_block_reason(body: &JsonValue) -> Option<String> {
    if let Some(reason) = body
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        return Some(format!("prompt blocked ({})", reason));
    }

    let finish_reason = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("finishReason"))
        .and_then(|r| r.as_str())?;

    if finish_reason == "SAFETY" || finish_reason == "PROHIBITED_CONTENT" {
        Some(format!("candidate blocked ({})", finish_reason))
    } else {
        None
    }
}

#[async_trait]
impl ScoringClient for GeminiClient {
    async fn score(&self, input: &ScoringInput) -> Result<ScoringResult, ScoringError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let request = serde_json::json!({
            "contents": [{
                "parts": [{ "text": judge_prompt(input) }]
            }],
            "generationConfig": {
                "temperature": 0.0,
                "responseMimeType": "application/json"
            }
        });

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => ScoringError::CredentialInvalid(format!("HTTP {}", status)),
                429 => ScoringError::RateLimited(format!("HTTP {}", status)),
                _ => ScoringError::Api(format!("HTTP {}: {}", status, body)),
            });
        }

        let body: JsonValue = response.json().await?;

        if let Some(reason) = safety_block_reason(&body) {
            warn!(model = %self.model, reason = %reason, "Scoring call blocked by safety filter");
            return Err(ScoringError::ContentBlocked(reason));
        }

        let text = body
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.pointer("/content/parts/0/text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| ScoringError::Parse("missing candidate text".to_string()))?;

        let outcome = parse_outcome(text)?;

        let usage = body.get("usageMetadata").map(|u| TokenUsage {
            prompt_tokens: u
                .get("promptTokenCount")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            completion_tokens: u
                .get("candidatesTokenCount")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
        });

        debug!(
            model = %self.model,
            similarity = outcome.similarity_score,
            factual = outcome.factual_accuracy,
            relevance = outcome.relevance_score,
            "Scoring call complete"
        );

        Ok(ScoringResult { outcome, usage })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn cost_per_token(&self) -> (f64, f64) {
        // Per-1M-token pricing as of early 2026
        match self.model.as_str() {
            "gemini-2.0-flash" => (0.0000001, 0.0000004), // $0.10/$0.40 per 1M
            "gemini-1.5-pro" => (0.00000125, 0.000005),   // $1.25/$5 per 1M
            _ => (0.0000001, 0.0000004),                  // Default to flash pricing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExecutionStatus;

    #[test]
    fn test_extract_json_object_plain() {
        let text = r#"{"a": 1}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_json_object_with_prose() {
        let text = "Sure! Here is the evaluation:\n{\"a\": {\"b\": 2}}\nHope that helps.";
        assert_eq!(extract_json_object(text), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn test_extract_json_object_braces_in_strings() {
        let text = r#"{"justification": "uses { and } and \" inside"}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_extract_json_object_none() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{unterminated"), None);
    }

    #[test]
    fn test_parse_outcome_valid() {
        let text = r#"Evaluation follows.
{
  "similarity_score": 90,
  "factual_accuracy": 88,
  "relevance_score": 80,
  "justification": "close match",
  "cognitive_gaps": ["misses pricing detail"],
  "improvement_suggestions": ["mention refund window"]
}"#;
        let outcome = parse_outcome(text).unwrap();
        assert_eq!(outcome.similarity_score, 90.0);
        assert_eq!(outcome.cognitive_gaps.len(), 1);
        assert_eq!(outcome.status(), ExecutionStatus::Passed);
    }

    #[test]
    fn test_parse_outcome_clamps_scores() {
        let text = r#"{"similarity_score": 150, "factual_accuracy": -10, "relevance_score": 50, "justification": ""}"#;
        let outcome = parse_outcome(text).unwrap();
        assert_eq!(outcome.similarity_score, 100.0);
        assert_eq!(outcome.factual_accuracy, 0.0);
    }

    #[test]
    fn test_parse_outcome_missing_field() {
        let text = r#"{"similarity_score": 80, "justification": "partial"}"#;
        let err = parse_outcome(text).unwrap_err();
        assert!(matches!(err, ScoringError::Parse(_)));
    }

    #[test]
    fn test_parse_outcome_no_json() {
        let err = parse_outcome("I cannot evaluate this.").unwrap_err();
        assert!(matches!(err, ScoringError::Parse(_)));
    }

    #[test]
    fn test_safety_block_prompt_feedback() {
        let body = serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        });
        assert!(safety_block_reason(&body).unwrap().contains("SAFETY"));
    }

    #[test]
    fn test_safety_block_finish_reason() {
        let body = serde_json::json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        });
        assert!(safety_block_reason(&body).is_some());

        let ok = serde_json::json!({
            "candidates": [{ "finishReason": "STOP" }]
        });
        assert!(safety_block_reason(&ok).is_none());
    }

    #[test]
    fn test_token_usage_cost() {
        let usage = TokenUsage {
            prompt_tokens: 1000,
            completion_tokens: 500,
        };
        // Flash pricing: $0.10/$0.40 per 1M
        let cost = usage.cost(0.0000001, 0.0000004);
        assert!((cost - 0.0003).abs() < 1e-9);
        assert_eq!(usage.total(), 1500);
    }

    #[test]
    fn test_judge_prompt_contains_inputs() {
        let input = ScoringInput {
            question: "What is the refund window?".to_string(),
            expected_answer: "30 days".to_string(),
            actual_answer: "One month".to_string(),
        };
        let prompt = judge_prompt(&input);
        assert!(prompt.contains("What is the refund window?"));
        assert!(prompt.contains("30 days"));
        assert!(prompt.contains("One month"));
        assert!(prompt.contains("similarity_score"));
    }
}

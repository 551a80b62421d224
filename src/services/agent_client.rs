//! Agent client - asks a configured agent to answer a test-case question.
//!
//! Connection credentials are resolved through the agent's secret reference
//! (an environment-variable name in this deployment), never read from the
//! database row itself.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::validator::ScoringError;

/// HTTP connect timeout for agent calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP total timeout for agent calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The fields of an agent the client needs to place a call.
#[derive(Debug, Clone)]
pub struct AgentEndpoint {
    pub name: String,
    pub platform_type: String,
    /// Secret-store reference resolving to the endpoint URL (and credentials).
    pub connection_secret_ref: String,
}

/// An agent's answer plus call latency.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub answer: String,
    pub latency_ms: i64,
}

/// Trait for agent connections; tests substitute a scripted mock.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Ask the agent one question and return its answer.
    async fn ask(&self, agent: &AgentEndpoint, question: &str)
    -> Result<AgentReply, ScoringError>;
}

/// HTTP agent client speaking the webhook contract: POST {"question"} to the
/// resolved endpoint, expect {"answer"} back. All supported platforms are
/// fronted by a connector exposing this contract.
#[derive(Clone)]
pub struct HttpAgentClient {
    http_client: reqwest::Client,
}

impl HttpAgentClient {
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client for agents");

        Self { http_client }
    }

    /// Resolve the secret reference to an endpoint URL.
    fn resolve_endpoint(&self, agent: &AgentEndpoint) -> Result<String, ScoringError> {
        std::env::var(&agent.connection_secret_ref).map_err(|_| {
            ScoringError::Api(format!(
                "connection secret '{}' is not configured",
                agent.connection_secret_ref
            ))
        })
    }
}

impl Default for HttpAgentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn ask(
        &self,
        agent: &AgentEndpoint,
        question: &str,
    ) -> Result<AgentReply, ScoringError> {
        let endpoint = self.resolve_endpoint(agent)?;
        let started = std::time::Instant::now();

        let response = self
            .http_client
            .post(&endpoint)
            .json(&serde_json::json!({ "question": question }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => ScoringError::CredentialInvalid(format!(
                    "agent '{}' rejected credentials (HTTP {})",
                    agent.name, status
                )),
                429 => {
                    ScoringError::RateLimited(format!("agent '{}' (HTTP {})", agent.name, status))
                }
                _ => ScoringError::Api(format!("agent '{}' returned HTTP {}", agent.name, status)),
            });
        }

        let body: JsonValue = response.json().await?;
        let answer = body
            .get("answer")
            .and_then(|a| a.as_str())
            .ok_or_else(|| {
                ScoringError::Parse(format!("agent '{}' reply missing 'answer'", agent.name))
            })?
            .to_string();

        let latency_ms = started.elapsed().as_millis() as i64;
        debug!(agent = %agent.name, latency_ms, "Agent call complete");

        Ok(AgentReply { answer, latency_ms })
    }
}

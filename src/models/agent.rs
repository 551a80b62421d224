//! Agent domain models and DTOs.
//!
//! An agent is a configured connection to an external conversational AI
//! endpoint. Connection credentials are never stored inline; rows carry a
//! secret reference resolved by the deployment's secret store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Platform the agent is hosted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlatformType {
    Dialogflow,
    Openai,
    Anthropic,
    /// Arbitrary HTTP endpoint speaking the webhook contract.
    Webhook,
}

impl PlatformType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dialogflow => "dialogflow",
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Webhook => "webhook",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dialogflow" => Some(Self::Dialogflow),
            "openai" => Some(Self::Openai),
            "anthropic" => Some(Self::Anthropic),
            "webhook" => Some(Self::Webhook),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlatformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Agent availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Active,
    Inactive,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to create an agent.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAgentRequest {
    /// Display name.
    pub name: String,
    /// Hosting platform.
    pub platform_type: PlatformType,
    /// Secret-store reference for connection credentials (never the secret
    /// itself).
    pub connection_secret_ref: String,
    /// Visible to every workspace when true (admin only).
    #[serde(default)]
    pub global: bool,
}

/// Request to update an agent.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateAgentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub connection_secret_ref: Option<String>,
    #[serde(default)]
    pub status: Option<AgentStatus>,
}

/// Detailed agent response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentDetailResponse {
    pub id: Uuid,
    pub name: String,
    pub platform_type: PlatformType,
    pub connection_secret_ref: String,
    pub status: AgentStatus,
    /// True for instance-wide agents not owned by any workspace.
    pub global: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Agent list response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentListResponse {
    pub agents: Vec<AgentDetailResponse>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_roundtrip() {
        for p in [
            PlatformType::Dialogflow,
            PlatformType::Openai,
            PlatformType::Anthropic,
            PlatformType::Webhook,
        ] {
            assert_eq!(PlatformType::parse(p.as_str()), Some(p));
        }
        assert_eq!(PlatformType::parse("telepathy"), None);
    }

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(AgentStatus::parse("active"), Some(AgentStatus::Active));
        assert_eq!(AgentStatus::parse("inactive"), Some(AgentStatus::Inactive));
        assert_eq!(AgentStatus::parse("paused"), None);
    }
}

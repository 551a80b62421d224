//! Business logic services.

pub mod agent_client;
pub mod api_key;
pub mod dispatcher;
pub mod domain_verification;
pub mod event_broadcaster;
pub mod registry;
pub mod reporting;
pub mod validator;

pub use agent_client::{AgentClient, HttpAgentClient};
pub use dispatcher::{BatchPlan, BatchRunner, ExecutionPolicy};
pub use domain_verification::DomainVerifier;
pub use event_broadcaster::EventBroadcaster;
pub use registry::BatchRegistry;
pub use validator::{GeminiClient, ScoringClient};

//! API endpoint modules.

pub mod agents;
pub mod batches;
pub mod benchmarks;
pub mod domains;
pub mod executions;
pub mod health;
pub mod keys;
pub mod openapi;
pub mod reports;
pub mod test_cases;
pub mod validator;
pub mod websocket;

pub use agents::configure_routes as configure_agent_routes;
pub use batches::configure_routes as configure_batch_routes;
pub use benchmarks::configure_routes as configure_benchmark_routes;
pub use domains::configure_routes as configure_domain_routes;
pub use executions::configure_routes as configure_execution_routes;
pub use health::configure_health_routes;
pub use keys::configure_routes as configure_key_routes;
pub use openapi::ApiDoc;
pub use reports::configure_routes as configure_report_routes;
pub use test_cases::configure_routes as configure_test_case_routes;
pub use validator::configure_routes as configure_validator_routes;
pub use websocket::configure_routes as configure_websocket_routes;

use crate::auth::ApiKeyAuth;
use crate::error::{AppError, AppResult};
use crate::models::ApiKeyRole;

/// Reject viewer-role callers from mutating endpoints.
pub(crate) fn forbid_viewer(auth: &ApiKeyAuth, action: &str) -> AppResult<()> {
    if auth.caller.role == ApiKeyRole::Viewer {
        return Err(AppError::Unauthorized(format!(
            "Viewer role cannot {}",
            action
        )));
    }
    Ok(())
}

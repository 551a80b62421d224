//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Skyvidya Eval Server",
        version = "0.4.0",
        description = "API server for managing AI chat agents, running evaluation suites against them, and producing quality/security compliance reports"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Agent endpoints
        api::agents::create_agent,
        api::agents::list_agents,
        api::agents::get_agent,
        api::agents::update_agent,
        api::agents::delete_agent,
        // Test case endpoints
        api::test_cases::create_test_case,
        api::test_cases::import_test_cases,
        api::test_cases::list_test_cases,
        api::test_cases::get_test_case,
        api::test_cases::delete_test_case,
        // Batch endpoints
        api::batches::dispatch_batch,
        api::batches::list_batches,
        api::batches::get_batch,
        api::batches::cancel_batch,
        // Validator endpoint
        api::validator::validate,
        // Execution endpoints
        api::executions::list_executions,
        api::executions::get_execution,
        api::executions::review_execution,
        // Benchmark endpoints
        api::benchmarks::create_benchmark,
        api::benchmarks::list_benchmarks,
        api::benchmarks::get_benchmark,
        api::benchmarks::refresh_benchmark,
        // Report and metrics endpoints
        api::reports::generate_report,
        api::reports::list_reports,
        api::reports::get_report,
        api::reports::review_report,
        api::reports::agent_metrics,
        api::reports::compliance_metrics,
        // Domain endpoints
        api::domains::register_domain,
        api::domains::list_domains,
        api::domains::verify_domain,
        // Auth endpoints
        api::keys::create_api_key,
        api::keys::list_api_keys,
        api::keys::get_api_key,
        api::keys::revoke_api_key,
        api::keys::restore_api_key,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Agents
            models::PlatformType,
            models::AgentStatus,
            models::CreateAgentRequest,
            models::UpdateAgentRequest,
            models::AgentDetailResponse,
            models::AgentListResponse,
            // Test cases
            models::TestType,
            models::Severity,
            models::CreateTestCaseRequest,
            models::ImportTestCasesRequest,
            models::ImportTestCasesResponse,
            models::TestCaseDetailResponse,
            models::TestCaseListResponse,
            models::QueryTestCasesParams,
            // Batches
            models::BatchStatus,
            models::DispatchMode,
            models::DispatchRequest,
            models::DispatchSummary,
            models::DispatchResponse,
            models::BatchDetailResponse,
            models::BatchListResponse,
            models::QueryBatchesParams,
            // Validator
            models::ValidateRequest,
            models::ValidationOutcome,
            models::ValidateResponse,
            // Executions
            models::ExecutionStatus,
            models::ScoreSet,
            models::ExecutionDetailResponse,
            models::ExecutionListResponse,
            models::QueryExecutionsParams,
            models::ReviewExecutionRequest,
            // Benchmarks
            models::CreateBenchmarkRequest,
            models::BenchmarkSnapshot,
            models::BenchmarkDetailResponse,
            models::BenchmarkListResponse,
            // Reports and metrics
            models::ReportKind,
            models::ReviewState,
            models::GenerateReportRequest,
            models::ReviewReportRequest,
            models::ReportDetailResponse,
            models::ReportListResponse,
            models::AgentMetrics,
            models::ComplianceBucket,
            models::ComplianceSummary,
            api::reports::MetricsWindow,
            // Domains
            models::RegisterDomainRequest,
            models::DomainResponse,
            models::VerifyDomainResponse,
            // Auth
            models::ApiKeyRole,
            models::ApiKeyCreateResponse,
            models::ApiKeyListItem,
            models::CreateApiKeyRequest,
            api::keys::ListApiKeysResponse,
            api::keys::RevokeApiKeyResponse,
            api::keys::RestoreApiKeyResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Agents", description = "Agent connection management"),
        (name = "TestCases", description = "Test case management and import"),
        (name = "Batches", description = "Batch dispatch, progress, and cancellation"),
        (name = "Validator", description = "Expected-vs-actual answer scoring"),
        (name = "Executions", description = "Recorded scoring attempts"),
        (name = "Benchmarks", description = "Named agent x test-case groupings"),
        (name = "Reports", description = "Generated reports, review workflow, and metrics"),
        (name = "Domains", description = "DNS-based domain verification"),
        (name = "Auth", description = "API key management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add API key security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-API-Key"),
                    ),
                ),
            );
        }
    }
}

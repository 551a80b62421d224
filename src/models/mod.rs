//! Domain models and DTOs.

pub mod agent;
pub mod api_key;
pub mod batch;
pub mod benchmark;
pub mod domain;
pub mod execution;
pub mod metrics;
pub mod report;
pub mod test_case;
pub mod validator;
pub mod ws_event;

pub use agent::{
    AgentDetailResponse, AgentListResponse, AgentStatus, CreateAgentRequest, PlatformType,
    UpdateAgentRequest,
};
pub use api_key::{
    ApiKey, ApiKeyCreateResponse, ApiKeyListItem, ApiKeyRole, AuthenticatedCaller,
    CreateApiKeyRequest,
};
pub use batch::{
    BatchDetailResponse, BatchListResponse, BatchStatus, DispatchMode, DispatchRequest,
    DispatchResponse, DispatchSummary, QueryBatchesParams,
};
pub use benchmark::{
    BenchmarkDetailResponse, BenchmarkListResponse, BenchmarkSnapshot, CreateBenchmarkRequest,
};
pub use domain::{DomainResponse, RegisterDomainRequest, VerifyDomainResponse};
pub use execution::{
    ExecutionDetailResponse, ExecutionListResponse, ExecutionStatus, QueryExecutionsParams,
    ReviewExecutionRequest, ScoreSet,
};
pub use metrics::{AgentMetrics, ComplianceBucket, ComplianceSummary};
pub use report::{
    GenerateReportRequest, ReportDetailResponse, ReportKind, ReportListResponse,
    ReviewReportRequest, ReviewState,
};
pub use test_case::{
    CreateTestCaseRequest, ImportTestCasesRequest, ImportTestCasesResponse, QueryTestCasesParams,
    Severity, TestCaseDetailResponse, TestCaseListResponse, TestType,
};
pub use validator::{ValidateRequest, ValidateResponse, ValidationOutcome};
pub use ws_event::{WsEvent, WsEventMessage};

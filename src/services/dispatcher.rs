//! Unified batch execution dispatcher.
//!
//! One executor serves both suite flavors, parameterized by an execution
//! policy: bounded-parallel fan-out for functional suites, strictly
//! sequential with inter-call spacing for security suites. Pairs are the
//! cross product of agents and test cases, generated agent-major,
//! test-case-minor.
//!
//! Failure of one pair increments the failure counter and appends an error
//! string; it never aborts siblings, and there is no retry. Cancellation is
//! cooperative: the flag is checked before each dispatch, in-flight calls
//! finish but terminal batches accept no further counter writes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::db::batch_executions::BatchCounters;
use crate::error::{AppError, AppResult};
use crate::models::{BatchStatus, DispatchSummary, ExecutionStatus, ValidationOutcome, WsEvent, WsEventMessage};

use super::agent_client::{AgentClient, AgentEndpoint};
use super::event_broadcaster::EventBroadcaster;
use super::registry::{BatchRegistry, CancelFlag};
use super::validator::{ScoringClient, ScoringInput};

/// How a dispatch run schedules its scoring calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// At most `max_in_flight` outstanding scoring calls, via one semaphore.
    Bounded { max_in_flight: usize },
    /// One call at a time with `delay` between consecutive call starts.
    Sequential { delay: Duration },
}

/// Agent half of a pair.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub id: Uuid,
    pub endpoint: AgentEndpoint,
}

/// Test-case half of a pair.
#[derive(Debug, Clone)]
pub struct CaseSpec {
    pub id: Uuid,
    pub question: String,
    pub expected_answer: String,
    pub security: bool,
    pub detection_patterns: Vec<String>,
}

/// Everything a dispatch run needs.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub batch_id: Uuid,
    pub workspace_id: Uuid,
    pub agents: Vec<AgentSpec>,
    pub cases: Vec<CaseSpec>,
    pub policy: ExecutionPolicy,
}

/// Outcome of one pair.
#[derive(Debug, Clone)]
struct PairOutcome {
    success: bool,
    error: Option<String>,
}

/// Persistence seam for the dispatcher. Implemented by [`DbPool`]; tests use
/// an in-memory store.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Insert a pending execution for a pair; returns its id.
    async fn create_pending(
        &self,
        workspace_id: Uuid,
        test_case_id: Uuid,
        agent_id: Uuid,
        batch_id: Option<Uuid>,
    ) -> AppResult<Uuid>;

    /// Write a validator outcome onto an execution; returns the derived status.
    async fn record_validation(
        &self,
        execution_id: Uuid,
        actual_answer: &str,
        outcome: &ValidationOutcome,
        latency_ms: Option<i64>,
        tokens_used: Option<i64>,
        cost_usd: Option<f64>,
    ) -> AppResult<ExecutionStatus>;

    /// Mark an execution failed (remote call error).
    async fn record_failure(&self, execution_id: Uuid, reason: &str) -> AppResult<()>;

    /// Guarded `pending -> running` transition.
    async fn begin_batch(&self, batch_id: Uuid) -> AppResult<bool>;

    /// Atomic pair-resolution increment; None when the batch is terminal.
    async fn record_pair(
        &self,
        batch_id: Uuid,
        success: bool,
        error: Option<&str>,
    ) -> AppResult<Option<BatchCounters>>;

    /// Executor-level failure write.
    async fn fail_batch(&self, batch_id: Uuid, reason: &str) -> AppResult<()>;
}

#[async_trait]
impl ExecutionStore for DbPool {
    async fn create_pending(
        &self,
        workspace_id: Uuid,
        test_case_id: Uuid,
        agent_id: Uuid,
        batch_id: Option<Uuid>,
    ) -> AppResult<Uuid> {
        let id = Uuid::now_v7();
        self.insert_execution(id, workspace_id, test_case_id, agent_id, batch_id)
            .await?;
        Ok(id)
    }

    async fn record_validation(
        &self,
        execution_id: Uuid,
        actual_answer: &str,
        outcome: &ValidationOutcome,
        latency_ms: Option<i64>,
        tokens_used: Option<i64>,
        cost_usd: Option<f64>,
    ) -> AppResult<ExecutionStatus> {
        let model = DbPool::record_validation(
            self,
            execution_id,
            actual_answer,
            outcome,
            latency_ms,
            tokens_used,
            cost_usd,
        )
        .await?;
        Ok(ExecutionStatus::parse(&model.status).unwrap_or(ExecutionStatus::Failed))
    }

    async fn record_failure(&self, execution_id: Uuid, reason: &str) -> AppResult<()> {
        self.fail_execution(execution_id, reason).await?;
        Ok(())
    }

    async fn begin_batch(&self, batch_id: Uuid) -> AppResult<bool> {
        self.try_begin_batch(batch_id).await
    }

    async fn record_pair(
        &self,
        batch_id: Uuid,
        success: bool,
        error: Option<&str>,
    ) -> AppResult<Option<BatchCounters>> {
        self.record_pair_result(batch_id, success, error).await
    }

    async fn fail_batch(&self, batch_id: Uuid, reason: &str) -> AppResult<()> {
        DbPool::fail_batch(self, batch_id, reason).await
    }
}

/// The batch runner - fans out scoring calls per the plan's policy.
#[derive(Clone)]
pub struct BatchRunner {
    store: Arc<dyn ExecutionStore>,
    agent_client: Arc<dyn AgentClient>,
    scorer: Arc<dyn ScoringClient>,
    broadcaster: EventBroadcaster,
    registry: BatchRegistry,
}

impl BatchRunner {
    pub fn new(
        store: Arc<dyn ExecutionStore>,
        agent_client: Arc<dyn AgentClient>,
        scorer: Arc<dyn ScoringClient>,
        broadcaster: EventBroadcaster,
        registry: BatchRegistry,
    ) -> Self {
        Self {
            store,
            agent_client,
            scorer,
            broadcaster,
            registry,
        }
    }

    /// Run a dispatch plan to completion and return the aggregate summary.
    ///
    /// The summary counts only pairs whose resolution reached the batch row;
    /// results landing after cancellation are discarded.
    pub async fn run(&self, plan: BatchPlan) -> AppResult<DispatchSummary> {
        let batch_id = plan.batch_id;
        let flag = self.registry.register(batch_id).await;

        if !self.store.begin_batch(batch_id).await? {
            // Cancelled (or otherwise moved) before the first dispatch
            self.registry.remove(batch_id).await;
            info!(batch_id = %batch_id, "Batch not in pending state, skipping fan-out");
            return Ok(DispatchSummary {
                success: 0,
                failed: 0,
                errors: Vec::new(),
            });
        }

        let result = match plan.policy {
            ExecutionPolicy::Sequential { delay } => {
                self.run_sequential(&plan, &flag, delay).await
            }
            ExecutionPolicy::Bounded { max_in_flight } => {
                self.run_bounded(&plan, &flag, max_in_flight).await
            }
        };

        self.registry.remove(batch_id).await;

        match result {
            Ok(summary) => {
                info!(
                    batch_id = %batch_id,
                    success = summary.success,
                    failed = summary.failed,
                    "Batch run finished"
                );
                Ok(summary)
            }
            Err(e) => {
                // Executor-level failure; pair failures never land here
                warn!(batch_id = %batch_id, error = %e, "Batch executor failed");
                if let Err(fail_err) = self.store.fail_batch(batch_id, &e.to_string()).await {
                    warn!(batch_id = %batch_id, error = %fail_err, "Could not mark batch failed");
                }
                Err(e)
            }
        }
    }

    /// Strictly ordered agent-major, test-case-minor execution with `delay`
    /// between consecutive call starts.
    async fn run_sequential(
        &self,
        plan: &BatchPlan,
        flag: &CancelFlag,
        delay: Duration,
    ) -> AppResult<DispatchSummary> {
        let mut summary = DispatchSummary {
            success: 0,
            failed: 0,
            errors: Vec::new(),
        };
        let mut first = true;

        'outer: for agent in &plan.agents {
            for case in &plan.cases {
                if flag.is_cancelled() {
                    break 'outer;
                }
                if !first {
                    tokio::time::sleep(delay).await;
                }
                first = false;

                let outcome = self.run_pair(plan, agent, case).await;
                self.resolve_pair(plan.batch_id, outcome, &mut summary).await;
            }
        }

        Ok(summary)
    }

    /// Bounded-parallel fan-out: one semaphore caps total in-flight calls.
    async fn run_bounded(
        &self,
        plan: &BatchPlan,
        flag: &CancelFlag,
        max_in_flight: usize,
    ) -> AppResult<DispatchSummary> {
        let sem = Arc::new(Semaphore::new(max_in_flight.max(1)));
        let mut join_set = JoinSet::new();

        'outer: for agent in &plan.agents {
            for case in &plan.cases {
                if flag.is_cancelled() {
                    break 'outer;
                }

                let permit = sem
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Upstream(format!("semaphore closed: {}", e)))?;

                // Re-check after waiting for a slot: cancellation during the
                // wait must not start a new call
                if flag.is_cancelled() {
                    break 'outer;
                }

                let this = self.clone();
                let plan = plan.clone();
                let agent = agent.clone();
                let case = case.clone();
                join_set.spawn(async move {
                    let _permit = permit;
                    this.run_pair(&plan, &agent, &case).await
                });
            }
        }

        let mut summary = DispatchSummary {
            success: 0,
            failed: 0,
            errors: Vec::new(),
        };

        while let Some(res) = join_set.join_next().await {
            let outcome = match res {
                Ok(outcome) => outcome,
                Err(e) => PairOutcome {
                    success: false,
                    error: Some(format!("task error: {}", e)),
                },
            };
            self.resolve_pair(plan.batch_id, outcome, &mut summary).await;
        }

        Ok(summary)
    }

    /// Execute one (agent, test case) pair: create the pending execution, ask
    /// the agent, score the answer, persist the result. Errors are terminal
    /// for the pair - no retry.
    async fn run_pair(&self, plan: &BatchPlan, agent: &AgentSpec, case: &CaseSpec) -> PairOutcome {
        let pair_label = format!("agent {} x case {}", agent.id, case.id);

        let execution_id = match self
            .store
            .create_pending(plan.workspace_id, case.id, agent.id, Some(plan.batch_id))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                return PairOutcome {
                    success: false,
                    error: Some(format!("{}: could not create execution: {}", pair_label, e)),
                };
            }
        };

        let reply = match self.agent_client.ask(&agent.endpoint, &case.question).await {
            Ok(reply) => reply,
            Err(e) => {
                let msg = format!("{}: {}", pair_label, e);
                if let Err(db_err) = self.store.record_failure(execution_id, &e.to_string()).await {
                    warn!(execution_id = %execution_id, error = %db_err, "Could not record failure");
                }
                return PairOutcome {
                    success: false,
                    error: Some(msg),
                };
            }
        };

        let input = ScoringInput {
            question: case.question.clone(),
            expected_answer: case.expected_answer.clone(),
            actual_answer: reply.answer.clone(),
        };

        let scored = match self.scorer.score(&input).await {
            Ok(scored) => scored,
            Err(e) => {
                let msg = format!("{}: {}", pair_label, e);
                if let Err(db_err) = self.store.record_failure(execution_id, &e.to_string()).await {
                    warn!(execution_id = %execution_id, error = %db_err, "Could not record failure");
                }
                return PairOutcome {
                    success: false,
                    error: Some(msg),
                };
            }
        };

        let mut outcome = scored.outcome;

        // Security cases: note any detection-pattern hits in the rationale
        if case.security && !case.detection_patterns.is_empty() {
            let answer_lower = reply.answer.to_lowercase();
            let hits: Vec<&str> = case
                .detection_patterns
                .iter()
                .filter(|p| answer_lower.contains(&p.to_lowercase()))
                .map(String::as_str)
                .collect();
            if !hits.is_empty() {
                outcome.justification = format!(
                    "{} [Detection patterns matched: {}]",
                    outcome.justification,
                    hits.join(", ")
                );
            }
        }

        let (input_cost, output_cost) = self.scorer.cost_per_token();
        let tokens_used = scored.usage.map(|u| u.total() as i64);
        let cost_usd = scored.usage.map(|u| u.cost(input_cost, output_cost));

        let status = match self
            .store
            .record_validation(
                execution_id,
                &reply.answer,
                &outcome,
                Some(reply.latency_ms),
                tokens_used,
                cost_usd,
            )
            .await
        {
            Ok(status) => status,
            Err(e) => {
                return PairOutcome {
                    success: false,
                    error: Some(format!("{}: could not persist validation: {}", pair_label, e)),
                };
            }
        };

        self.broadcaster.send(WsEventMessage::new(
            WsEvent::execution_recorded(execution_id, agent.id, case.id, status, Some(plan.batch_id)),
        ));

        // The pair succeeded whenever the scoring call completed; the derived
        // pass/warning/fail status is quality data, not a dispatch failure
        PairOutcome {
            success: true,
            error: None,
        }
    }

    /// Fold one pair outcome into the batch row and the summary, and push
    /// progress to subscribers. Outcomes landing on a terminal batch are
    /// discarded.
    async fn resolve_pair(
        &self,
        batch_id: Uuid,
        outcome: PairOutcome,
        summary: &mut DispatchSummary,
    ) {
        let counters = match self
            .store
            .record_pair(batch_id, outcome.success, outcome.error.as_deref())
            .await
        {
            Ok(Some(counters)) => counters,
            Ok(None) => {
                // Batch went terminal (cancelled) while this pair was in
                // flight; its result is discarded
                return;
            }
            Err(e) => {
                warn!(batch_id = %batch_id, error = %e, "Could not record pair resolution");
                return;
            }
        };

        if outcome.success {
            summary.success += 1;
        } else {
            summary.failed += 1;
            if let Some(error) = outcome.error {
                summary.errors.push(error);
            }
        }

        let status = counters.status_enum();
        self.broadcaster.send(WsEventMessage::new(WsEvent::batch_progress(
            batch_id,
            status,
            counters.total_tests,
            counters.completed_tests,
            counters.successful_tests,
            counters.failed_tests,
        )));

        if status == BatchStatus::Completed {
            self.broadcaster.send(WsEventMessage::new(WsEvent::batch_completed(
                batch_id,
                status,
                counters.successful_tests,
                counters.failed_tests,
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreSet;
    use crate::services::validator::{ScoringResult, TokenUsage};
    use tokio::sync::Mutex;
    use tokio::time::Instant;

    // ------------------------------------------------------------------
    // In-memory store mirroring the SQL guarantees: atomic increments and
    // the terminal-status guard.
    // ------------------------------------------------------------------

    #[derive(Debug)]
    struct MemState {
        executions: Vec<(Uuid, Uuid, Uuid)>, // (execution, agent, case)
        validated: usize,
        failed_executions: usize,
        status: BatchStatus,
        total: i32,
        completed: i32,
        successful: i32,
        failed: i32,
        error_log: Vec<String>,
    }

    struct MemoryStore {
        state: Mutex<MemState>,
    }

    impl MemoryStore {
        fn new(total: i32) -> Self {
            Self {
                state: Mutex::new(MemState {
                    executions: Vec::new(),
                    validated: 0,
                    failed_executions: 0,
                    status: BatchStatus::Pending,
                    total,
                    completed: 0,
                    successful: 0,
                    failed: 0,
                    error_log: Vec::new(),
                }),
            }
        }

        async fn set_cancelled(&self) {
            self.state.lock().await.status = BatchStatus::Cancelled;
        }
    }

    #[async_trait]
    impl ExecutionStore for MemoryStore {
        async fn create_pending(
            &self,
            _workspace_id: Uuid,
            test_case_id: Uuid,
            agent_id: Uuid,
            _batch_id: Option<Uuid>,
        ) -> AppResult<Uuid> {
            let id = Uuid::now_v7();
            self.state
                .lock()
                .await
                .executions
                .push((id, agent_id, test_case_id));
            Ok(id)
        }

        async fn record_validation(
            &self,
            _execution_id: Uuid,
            _actual_answer: &str,
            outcome: &ValidationOutcome,
            _latency_ms: Option<i64>,
            _tokens_used: Option<i64>,
            _cost_usd: Option<f64>,
        ) -> AppResult<ExecutionStatus> {
            self.state.lock().await.validated += 1;
            Ok(outcome.status())
        }

        async fn record_failure(&self, _execution_id: Uuid, _reason: &str) -> AppResult<()> {
            self.state.lock().await.failed_executions += 1;
            Ok(())
        }

        async fn begin_batch(&self, _batch_id: Uuid) -> AppResult<bool> {
            let mut state = self.state.lock().await;
            if state.status == BatchStatus::Pending {
                state.status = BatchStatus::Running;
                Ok(true)
            } else {
                Ok(false)
            }
        }

        async fn record_pair(
            &self,
            _batch_id: Uuid,
            success: bool,
            error: Option<&str>,
        ) -> AppResult<Option<BatchCounters>> {
            let mut state = self.state.lock().await;
            if state.status != BatchStatus::Running {
                return Ok(None);
            }

            state.completed += 1;
            assert!(
                state.completed <= state.total,
                "completed_tests exceeded total_tests"
            );
            if success {
                state.successful += 1;
            } else {
                state.failed += 1;
            }
            if let Some(error) = error {
                state.error_log.push(error.to_string());
            }
            if state.completed >= state.total {
                state.status = BatchStatus::Completed;
            }

            Ok(Some(BatchCounters {
                status: state.status.as_str().to_string(),
                total_tests: state.total,
                completed_tests: state.completed,
                successful_tests: state.successful,
                failed_tests: state.failed,
            }))
        }

        async fn fail_batch(&self, _batch_id: Uuid, reason: &str) -> AppResult<()> {
            let mut state = self.state.lock().await;
            state.status = BatchStatus::Failed;
            state.error_log.push(reason.to_string());
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Scripted agent and scorer
    // ------------------------------------------------------------------

    #[derive(Debug, Clone)]
    struct CallRecord {
        agent: String,
        question: String,
        at: Instant,
    }

    struct MockAgent {
        calls: Mutex<Vec<CallRecord>>,
        /// (agent name, question) whose call errors
        fail_pair: Option<(String, String)>,
        /// Trip cancellation after this many calls have started
        cancel_after: Option<usize>,
        registry: BatchRegistry,
        batch_id: Uuid,
        store: Option<Arc<MemoryStore>>,
    }

    impl MockAgent {
        fn new(registry: BatchRegistry, batch_id: Uuid) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_pair: None,
                cancel_after: None,
                registry,
                batch_id,
                store: None,
            }
        }

        async fn call_log(&self) -> Vec<CallRecord> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl AgentClient for MockAgent {
        async fn ask(
            &self,
            agent: &AgentEndpoint,
            question: &str,
        ) -> Result<super::super::agent_client::AgentReply, super::super::validator::ScoringError>
        {
            let call_count = {
                let mut calls = self.calls.lock().await;
                calls.push(CallRecord {
                    agent: agent.name.clone(),
                    question: question.to_string(),
                    at: Instant::now(),
                });
                calls.len()
            };

            if let Some(cancel_after) = self.cancel_after
                && call_count == cancel_after
            {
                self.registry.cancel(self.batch_id).await;
                if let Some(ref store) = self.store {
                    store.set_cancelled().await;
                }
            }

            if let Some((ref fail_agent, ref fail_question)) = self.fail_pair
                && agent.name == *fail_agent
                && question == *fail_question
            {
                return Err(super::super::validator::ScoringError::Api(
                    "connection refused".to_string(),
                ));
            }

            Ok(super::super::agent_client::AgentReply {
                answer: format!("answer to {}", question),
                latency_ms: 5,
            })
        }
    }

    struct MockScorer {
        scores: ScoreSet,
    }

    impl MockScorer {
        fn passing() -> Self {
            Self {
                scores: ScoreSet {
                    similarity: 90.0,
                    factual_accuracy: 88.0,
                    relevance: 80.0,
                },
            }
        }
    }

    #[async_trait]
    impl ScoringClient for MockScorer {
        async fn score(&self, _input: &ScoringInput) -> Result<ScoringResult, super::super::validator::ScoringError> {
            Ok(ScoringResult {
                outcome: ValidationOutcome {
                    similarity_score: self.scores.similarity,
                    factual_accuracy: self.scores.factual_accuracy,
                    relevance_score: self.scores.relevance,
                    justification: "scripted".to_string(),
                    cognitive_gaps: vec![],
                    improvement_suggestions: vec![],
                },
                usage: Some(TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                }),
            })
        }

        fn model_name(&self) -> &str {
            "mock"
        }

        fn cost_per_token(&self) -> (f64, f64) {
            (0.0, 0.0)
        }
    }

    // ------------------------------------------------------------------
    // Plan helpers
    // ------------------------------------------------------------------

    fn agent_spec(name: &str) -> AgentSpec {
        AgentSpec {
            id: Uuid::now_v7(),
            endpoint: AgentEndpoint {
                name: name.to_string(),
                platform_type: "webhook".to_string(),
                connection_secret_ref: format!("SECRET_{}", name.to_uppercase()),
            },
        }
    }

    fn case_spec(question: &str) -> CaseSpec {
        CaseSpec {
            id: Uuid::now_v7(),
            question: question.to_string(),
            expected_answer: format!("expected for {}", question),
            security: false,
            detection_patterns: vec![],
        }
    }

    fn make_plan(agents: usize, cases: usize, policy: ExecutionPolicy) -> BatchPlan {
        BatchPlan {
            batch_id: Uuid::now_v7(),
            workspace_id: Uuid::now_v7(),
            agents: (1..=agents).map(|i| agent_spec(&format!("a{}", i))).collect(),
            cases: (1..=cases).map(|i| case_spec(&format!("q{}", i))).collect(),
            policy,
        }
    }

    fn make_runner(
        store: Arc<MemoryStore>,
        agent: Arc<MockAgent>,
        registry: BatchRegistry,
    ) -> BatchRunner {
        BatchRunner::new(
            store,
            agent,
            Arc::new(MockScorer::passing()),
            EventBroadcaster::new(),
            registry,
        )
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    /// 2 agents x 3 cases at concurrency 3: 6 pairs, 5 succeed, 1 fails,
    /// exactly one error entry, batch completes.
    #[tokio::test]
    async fn test_bounded_runs_full_cross_product() {
        let registry = BatchRegistry::new();
        let plan = make_plan(2, 3, ExecutionPolicy::Bounded { max_in_flight: 3 });
        let store = Arc::new(MemoryStore::new(6));

        let mut agent = MockAgent::new(registry.clone(), plan.batch_id);
        agent.fail_pair = Some(("a2".to_string(), "q3".to_string()));
        let agent = Arc::new(agent);

        let runner = make_runner(store.clone(), agent.clone(), registry);
        let summary = runner.run(plan).await.unwrap();

        assert_eq!(summary.success, 5);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("connection refused"));

        let state = store.state.lock().await;
        assert_eq!(state.executions.len(), 6);
        assert_eq!(state.completed, 6);
        assert_eq!(state.total, 6);
        assert_eq!(state.successful, 5);
        assert_eq!(state.failed, 1);
        assert_eq!(state.status, BatchStatus::Completed);
        assert_eq!(state.error_log.len(), 1);
        // 5 validations persisted, 1 execution marked failed
        assert_eq!(state.validated, 5);
        assert_eq!(state.failed_executions, 1);

        assert_eq!(agent.call_log().await.len(), 6);
    }

    /// Sequential policy: N x M calls, agent-major test-case-minor order,
    /// with at least the configured delay between consecutive call starts.
    #[tokio::test(start_paused = true)]
    async fn test_sequential_order_and_spacing() {
        let registry = BatchRegistry::new();
        let delay = Duration::from_millis(1000);
        let plan = make_plan(2, 2, ExecutionPolicy::Sequential { delay });
        let store = Arc::new(MemoryStore::new(4));
        let agent = Arc::new(MockAgent::new(registry.clone(), plan.batch_id));

        let runner = make_runner(store.clone(), agent.clone(), registry);
        let summary = runner.run(plan).await.unwrap();

        assert_eq!(summary.success, 4);
        assert_eq!(summary.failed, 0);

        let calls = agent.call_log().await;
        assert_eq!(calls.len(), 4);

        // Agent-major, test-case-minor ordering
        let order: Vec<(String, String)> = calls
            .iter()
            .map(|c| (c.agent.clone(), c.question.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a1".to_string(), "q1".to_string()),
                ("a1".to_string(), "q2".to_string()),
                ("a2".to_string(), "q1".to_string()),
                ("a2".to_string(), "q2".to_string()),
            ]
        );

        // Consecutive call starts separated by at least the delay
        for pair in calls.windows(2) {
            let gap = pair[1].at.duration_since(pair[0].at);
            assert!(gap >= delay, "gap {:?} shorter than delay {:?}", gap, delay);
        }
    }

    /// Cooperative cancellation: no new calls start once the flag trips;
    /// already-recorded counts are untouched.
    #[tokio::test(start_paused = true)]
    async fn test_sequential_cancel_stops_new_dispatches() {
        let registry = BatchRegistry::new();
        let plan = make_plan(2, 2, ExecutionPolicy::Sequential {
            delay: Duration::from_millis(100),
        });
        let store = Arc::new(MemoryStore::new(4));

        // Trip the flag during the second call; that call is in flight and
        // may finish, but pairs 3 and 4 must never start
        let mut agent = MockAgent::new(registry.clone(), plan.batch_id);
        agent.cancel_after = Some(2);
        let agent = Arc::new(agent);

        let runner = make_runner(store.clone(), agent.clone(), registry);
        let summary = runner.run(plan).await.unwrap();

        assert_eq!(agent.call_log().await.len(), 2);
        assert_eq!(summary.success, 2);

        let state = store.state.lock().await;
        assert_eq!(state.executions.len(), 2);
        assert_eq!(state.completed, 2);
        assert_eq!(state.successful, 2);
    }

    /// Results landing after the batch went terminal are discarded: counters
    /// recorded before cancellation never change retroactively.
    #[tokio::test]
    async fn test_results_after_terminal_batch_are_discarded() {
        let registry = BatchRegistry::new();
        let plan = make_plan(1, 2, ExecutionPolicy::Bounded { max_in_flight: 2 });
        let store = Arc::new(MemoryStore::new(2));

        // First call cancels the batch (flag + persisted status); both pairs
        // are already in flight and finish, but neither may reach the counters
        let mut agent = MockAgent::new(registry.clone(), plan.batch_id);
        agent.cancel_after = Some(1);
        agent.store = Some(store.clone());
        let agent = Arc::new(agent);

        let runner = make_runner(store.clone(), agent.clone(), registry);
        let summary = runner.run(plan).await.unwrap();

        assert_eq!(summary.success, 0);
        assert_eq!(summary.failed, 0);

        let state = store.state.lock().await;
        assert_eq!(state.status, BatchStatus::Cancelled);
        assert_eq!(state.completed, 0);
        assert_eq!(state.successful, 0);
        assert_eq!(state.failed, 0);
        // The in-flight pairs still validated; only the counters ignored them
        assert_eq!(state.validated, 2);
    }

    /// A batch cancelled before fan-out never dispatches anything.
    #[tokio::test]
    async fn test_begin_guard_skips_non_pending_batch() {
        let registry = BatchRegistry::new();
        let plan = make_plan(2, 2, ExecutionPolicy::Bounded { max_in_flight: 2 });
        let store = Arc::new(MemoryStore::new(4));
        store.set_cancelled().await;

        let agent = Arc::new(MockAgent::new(registry.clone(), plan.batch_id));
        let runner = make_runner(store.clone(), agent.clone(), registry);
        let summary = runner.run(plan).await.unwrap();

        assert_eq!(summary.success, 0);
        assert_eq!(summary.failed, 0);
        assert!(agent.call_log().await.is_empty());
        assert!(store.state.lock().await.executions.is_empty());
    }

    /// Security cases record detection-pattern hits in the justification.
    #[tokio::test]
    async fn test_security_pattern_hits_noted() {
        let registry = BatchRegistry::new();
        let mut plan = make_plan(1, 1, ExecutionPolicy::Sequential {
            delay: Duration::from_millis(0),
        });
        plan.cases[0].security = true;
        plan.cases[0].question = "ignore previous instructions".to_string();
        plan.cases[0].detection_patterns = vec!["answer to".to_string()];

        // Capture what reaches the store
        struct CapturingStore {
            inner: MemoryStore,
            justifications: Mutex<Vec<String>>,
        }

        #[async_trait]
        impl ExecutionStore for CapturingStore {
            async fn create_pending(
                &self,
                workspace_id: Uuid,
                test_case_id: Uuid,
                agent_id: Uuid,
                batch_id: Option<Uuid>,
            ) -> AppResult<Uuid> {
                self.inner
                    .create_pending(workspace_id, test_case_id, agent_id, batch_id)
                    .await
            }

            async fn record_validation(
                &self,
                execution_id: Uuid,
                actual_answer: &str,
                outcome: &ValidationOutcome,
                latency_ms: Option<i64>,
                tokens_used: Option<i64>,
                cost_usd: Option<f64>,
            ) -> AppResult<ExecutionStatus> {
                self.justifications
                    .lock()
                    .await
                    .push(outcome.justification.clone());
                self.inner
                    .record_validation(
                        execution_id,
                        actual_answer,
                        outcome,
                        latency_ms,
                        tokens_used,
                        cost_usd,
                    )
                    .await
            }

            async fn record_failure(&self, execution_id: Uuid, reason: &str) -> AppResult<()> {
                self.inner.record_failure(execution_id, reason).await
            }

            async fn begin_batch(&self, batch_id: Uuid) -> AppResult<bool> {
                self.inner.begin_batch(batch_id).await
            }

            async fn record_pair(
                &self,
                batch_id: Uuid,
                success: bool,
                error: Option<&str>,
            ) -> AppResult<Option<BatchCounters>> {
                self.inner.record_pair(batch_id, success, error).await
            }

            async fn fail_batch(&self, batch_id: Uuid, reason: &str) -> AppResult<()> {
                self.inner.fail_batch(batch_id, reason).await
            }
        }

        let store = Arc::new(CapturingStore {
            inner: MemoryStore::new(1),
            justifications: Mutex::new(Vec::new()),
        });
        let agent = Arc::new(MockAgent::new(registry.clone(), plan.batch_id));

        let runner = BatchRunner::new(
            store.clone(),
            agent,
            Arc::new(MockScorer::passing()),
            EventBroadcaster::new(),
            registry,
        );
        let summary = runner.run(plan).await.unwrap();
        assert_eq!(summary.success, 1);

        let justifications = store.justifications.lock().await;
        assert_eq!(justifications.len(), 1);
        assert!(justifications[0].contains("Detection patterns matched"));
    }
}

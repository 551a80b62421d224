//! Report generation - rolls executions up into review-report payloads and
//! refreshes benchmark snapshots.

use chrono::{DateTime, Utc};
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{BenchmarkSnapshot, ReportKind};

/// Build the payload document for a report over a period.
pub async fn generate_payload(
    pool: &DbPool,
    workspace_id: Uuid,
    kind: ReportKind,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> AppResult<JsonValue> {
    match kind {
        ReportKind::Improvement => {
            let agents = pool
                .agent_metrics(workspace_id, period_start, period_end)
                .await?;

            let total_executions: i64 = agents.iter().map(|a| a.executions).sum();
            let total_passed: i64 = agents.iter().map(|a| a.passed).sum();
            let total_cost: f64 = agents.iter().map(|a| a.total_cost_usd).sum();

            Ok(json!({
                "kind": kind.as_str(),
                "period_start": period_start,
                "period_end": period_end,
                "totals": {
                    "executions": total_executions,
                    "passed": total_passed,
                    "cost_usd": total_cost,
                },
                "agents": agents,
            }))
        }
        ReportKind::SecurityCompliance => {
            let summary = pool
                .compliance_summary(workspace_id, period_start, period_end)
                .await?;

            Ok(json!({
                "kind": kind.as_str(),
                "period_start": period_start,
                "period_end": period_end,
                "compliance": summary,
            }))
        }
    }
}

/// Recompute and persist a benchmark's results snapshot.
pub async fn refresh_benchmark_snapshot(
    pool: &DbPool,
    workspace_id: Uuid,
    benchmark_id: Uuid,
    agent_ids: &[Uuid],
    test_case_ids: &[Uuid],
) -> AppResult<BenchmarkSnapshot> {
    let agents = pool
        .benchmark_agent_results(workspace_id, agent_ids, test_case_ids)
        .await?;

    let snapshot = BenchmarkSnapshot {
        refreshed_at: Some(Utc::now()),
        agents,
    };

    pool.update_benchmark_snapshot(workspace_id, benchmark_id, &snapshot)
        .await?;

    Ok(snapshot)
}

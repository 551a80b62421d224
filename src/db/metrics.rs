//! Read-side aggregation queries for reporting.
//!
//! These roll executions up into per-agent quality/speed/cost metrics and
//! workspace compliance summaries. All heavy lifting stays in SQL.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseBackend, FromQueryResult, Statement};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::benchmark::BenchmarkAgentResult;
use crate::models::{AgentMetrics, ComplianceBucket, ComplianceSummary};

use super::DbPool;

#[derive(Debug, FromQueryResult)]
struct AgentMetricsRow {
    agent_id: Uuid,
    executions: i64,
    passed: i64,
    warnings: i64,
    failed: i64,
    accuracy: Option<f64>,
    mean_latency_ms: Option<f64>,
    total_tokens: i64,
    total_cost_usd: f64,
}

#[derive(Debug, FromQueryResult)]
struct BucketRow {
    label: String,
    total: i64,
    passed: i64,
}

impl DbPool {
    /// Per-agent metrics over validated executions in a period.
    pub async fn agent_metrics(
        &self,
        workspace_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<AgentMetrics>> {
        let sql = "SELECT agent_id,
                          COUNT(*) AS executions,
                          COUNT(*) FILTER (WHERE status = 'passed') AS passed,
                          COUNT(*) FILTER (WHERE status = 'warning') AS warnings,
                          COUNT(*) FILTER (WHERE status = 'failed') AS failed,
                          AVG((similarity_score + factual_accuracy + relevance_score) / 3.0)::double precision AS accuracy,
                          AVG(latency_ms)::double precision AS mean_latency_ms,
                          COALESCE(SUM(tokens_used), 0)::bigint AS total_tokens,
                          COALESCE(SUM(cost_usd), 0)::double precision AS total_cost_usd
                   FROM executions
                   WHERE workspace_id = $1
                     AND status IN ('passed', 'warning', 'failed')
                     AND created_at >= $2 AND created_at <= $3
                   GROUP BY agent_id
                   ORDER BY agent_id";

        let rows: Vec<AgentMetricsRow> = AgentMetricsRow::find_by_statement(
            Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                sql,
                [
                    sea_orm::Value::Uuid(Some(workspace_id)),
                    from.into(),
                    to.into(),
                ],
            ),
        )
        .all(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to aggregate agent metrics: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let pass_rate = if r.executions > 0 {
                    Some(r.passed as f64 / r.executions as f64)
                } else {
                    None
                };
                AgentMetrics {
                    agent_id: r.agent_id,
                    executions: r.executions,
                    passed: r.passed,
                    warnings: r.warnings,
                    failed: r.failed,
                    accuracy: r.accuracy,
                    pass_rate,
                    mean_latency_ms: r.mean_latency_ms,
                    total_tokens: r.total_tokens,
                    total_cost_usd: r.total_cost_usd,
                }
            })
            .collect())
    }

    /// Security-compliance rollup over a period.
    pub async fn compliance_summary(
        &self,
        workspace_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<ComplianceSummary> {
        let by_severity = self
            .compliance_buckets(workspace_id, from, to, "COALESCE(tc.severity, 'unspecified')")
            .await?;
        let by_attack_category = self
            .compliance_buckets(
                workspace_id,
                from,
                to,
                "COALESCE(tc.attack_category, 'unspecified')",
            )
            .await?;

        let total: i64 = by_severity.iter().map(|b| b.total).sum();
        let passed: i64 = by_severity.iter().map(|b| b.passed).sum();

        Ok(ComplianceSummary {
            total_security_executions: total,
            passed,
            compliance_score: ComplianceSummary::score(total, passed),
            by_severity,
            by_attack_category,
        })
    }

    async fn compliance_buckets(
        &self,
        workspace_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        label_expr: &str,
    ) -> AppResult<Vec<ComplianceBucket>> {
        // label_expr is one of two compile-time constants above, never user input
        let sql = format!(
            "SELECT {} AS label,
                    COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE e.status = 'passed') AS passed
             FROM executions e
             JOIN test_cases tc ON tc.id = e.test_case_id
             WHERE e.workspace_id = $1
               AND tc.test_type = 'security'
               AND e.status IN ('passed', 'warning', 'failed')
               AND e.created_at >= $2 AND e.created_at <= $3
             GROUP BY 1
             ORDER BY 1",
            label_expr
        );

        let rows: Vec<BucketRow> =
            BucketRow::find_by_statement(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                [
                    sea_orm::Value::Uuid(Some(workspace_id)),
                    from.into(),
                    to.into(),
                ],
            ))
            .all(self.connection())
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to aggregate compliance buckets: {}", e))
            })?;

        Ok(rows
            .into_iter()
            .map(|r| ComplianceBucket {
                label: r.label,
                total: r.total,
                passed: r.passed,
            })
            .collect())
    }

    /// Per-agent aggregates for a benchmark's agent x test-case grouping.
    pub async fn benchmark_agent_results(
        &self,
        workspace_id: Uuid,
        agent_ids: &[Uuid],
        test_case_ids: &[Uuid],
    ) -> AppResult<Vec<BenchmarkAgentResult>> {
        if agent_ids.is_empty() || test_case_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Build placeholders for both IN clauses ($2..)
        let mut values: Vec<sea_orm::Value> =
            vec![sea_orm::Value::Uuid(Some(workspace_id))];
        let agent_placeholders: Vec<String> = agent_ids
            .iter()
            .enumerate()
            .map(|(i, _)| format!("${}", i + 2))
            .collect();
        values.extend(
            agent_ids
                .iter()
                .map(|id| sea_orm::Value::Uuid(Some(*id))),
        );
        let base = agent_ids.len() + 2;
        let case_placeholders: Vec<String> = test_case_ids
            .iter()
            .enumerate()
            .map(|(i, _)| format!("${}", base + i))
            .collect();
        values.extend(
            test_case_ids
                .iter()
                .map(|id| sea_orm::Value::Uuid(Some(*id))),
        );

        let sql = format!(
            "SELECT agent_id,
                    COUNT(*) AS executions,
                    COUNT(*) FILTER (WHERE status = 'passed') AS passed,
                    COUNT(*) FILTER (WHERE status = 'warning') AS warnings,
                    COUNT(*) FILTER (WHERE status = 'failed') AS failed,
                    AVG((similarity_score + factual_accuracy + relevance_score) / 3.0)::double precision AS mean_score,
                    AVG(latency_ms)::double precision AS mean_latency_ms
             FROM executions
             WHERE workspace_id = $1
               AND agent_id IN ({})
               AND test_case_id IN ({})
               AND status IN ('passed', 'warning', 'failed')
             GROUP BY agent_id
             ORDER BY agent_id",
            agent_placeholders.join(", "),
            case_placeholders.join(", ")
        );

        #[derive(Debug, FromQueryResult)]
        struct ResultRow {
            agent_id: Uuid,
            executions: i64,
            passed: i64,
            warnings: i64,
            failed: i64,
            mean_score: Option<f64>,
            mean_latency_ms: Option<f64>,
        }

        let rows: Vec<ResultRow> = ResultRow::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &sql,
            values,
        ))
        .all(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to aggregate benchmark results: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|r| BenchmarkAgentResult {
                agent_id: r.agent_id,
                executions: r.executions,
                passed: r.passed,
                warnings: r.warnings,
                failed: r.failed,
                mean_score: r.mean_score,
                mean_latency_ms: r.mean_latency_ms,
            })
            .collect())
    }
}

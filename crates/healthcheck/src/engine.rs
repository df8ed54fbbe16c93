//! The health-check engine: one diagnostic run per operation.
//!
//! A run loads scoring policies, pulls raw metrics per category from the
//! external sources, scores each category, aggregates the weighted
//! composite, and persists the report. Config load and final persistence
//! are the only fatal steps; every per-category fetch failure is recorded
//! as evidence and the run keeps going.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use steward_core::categories::{
    advice_for, CAT_ACTIVE_SESSIONS, CAT_CACHE_HIT, CAT_CONNECTION_USAGE, CAT_CPU_USAGE,
    CAT_DB_CONFIG, CAT_DISK_CAPACITY, CAT_IO_UTIL, CAT_SLOW_QUERY, METRIC_ACTIVE_SESSIONS,
    METRIC_CACHE_HIT, METRIC_CONNECTION_USAGE, METRIC_CPU_USAGE, METRIC_DISK_CAPACITY,
    METRIC_IO_UTIL,
};
use steward_core::error::CoreError;
use steward_core::scoring::{self, CategoryPolicy, MAX_SCORE};
use steward_db::models::operation::Operation;
use steward_db::models::report::{CategoryColumns, NewReport, Report};
use steward_db::models::status::OperationStatus;
use steward_db::repositories::{EngineConfigRepo, OperationRepo, ReportRepo};
use steward_db::DbPool;
use steward_metrics::SourceError;

use crate::sources::MetricSources;

/// Default per-category fetch budget, distinct from the overall operation.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Server variables with a recommended baseline value. A deviation count
/// is the raw value scored for the `db_config` category.
const RECOMMENDED_VARIABLES: &[(&str, &str)] = &[
    ("innodb_flush_log_at_trx_commit", "1"),
    ("sync_binlog", "1"),
    ("slow_query_log", "ON"),
    ("innodb_file_per_table", "ON"),
    ("log_bin", "ON"),
];

/// A raw fetched value plus a human-readable summary of where it came from.
type Sample = (f64, String);

/// One executable health-check run. Kept as a capability trait so an
/// alternate scoring strategy can be swapped in without touching the
/// lifecycle manager.
#[async_trait]
pub trait Engine: Send {
    /// Execute the run to completion. Infallible at the signature level:
    /// every outcome is recorded on the operation row.
    async fn run(self: Box<Self>);
}

/// The standard watermark-scoring engine.
pub struct DefaultEngine {
    pool: DbPool,
    sources: MetricSources,
    operation: Operation,
    fetch_timeout: Duration,
}

#[async_trait]
impl Engine for DefaultEngine {
    async fn run(self: Box<Self>) {
        let operation_id = self.operation.id;
        let server_id = self.operation.server_id;

        // Pending -> Running. If even this fails the run cannot proceed;
        // mark the operation failed so no Pending row is orphaned.
        match OperationRepo::update_status(
            &self.pool,
            operation_id,
            OperationStatus::Pending,
            OperationStatus::Running,
            None,
        )
        .await
        {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::error!(operation_id, "operation missing or no longer pending at engine start");
                return;
            }
            Err(e) => {
                tracing::error!(operation_id, error = %e, "failed to mark operation running");
                let _ = OperationRepo::update_status(
                    &self.pool,
                    operation_id,
                    OperationStatus::Pending,
                    OperationStatus::Failed,
                    Some("could not transition to running"),
                )
                .await;
                return;
            }
        }

        match self.execute().await {
            Ok(report) => {
                let result = OperationRepo::update_status(
                    &self.pool,
                    operation_id,
                    OperationStatus::Running,
                    OperationStatus::Completed,
                    None,
                )
                .await;
                if let Err(e) = result {
                    tracing::error!(operation_id, error = %e, "failed to mark operation completed");
                }
                tracing::info!(
                    operation_id,
                    server_id,
                    weighted_average_score = report.weighted_average_score,
                    "health check completed",
                );
            }
            Err(e) => {
                tracing::error!(operation_id, server_id, error = %e, "health check failed");
                let result = OperationRepo::update_status(
                    &self.pool,
                    operation_id,
                    OperationStatus::Running,
                    OperationStatus::Failed,
                    Some(&e.to_string()),
                )
                .await;
                if let Err(e) = result {
                    tracing::error!(operation_id, error = %e, "failed to mark operation failed");
                }
            }
        }
    }
}

impl DefaultEngine {
    pub fn new(
        pool: DbPool,
        sources: MetricSources,
        operation: Operation,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            sources,
            operation,
            fetch_timeout,
        }
    }

    /// The fallible body of a run: load policies, fetch + score each
    /// category, aggregate, persist.
    async fn execute(&self) -> Result<Report, CoreError> {
        // Fatal precondition: scoring is meaningless without policies.
        let rows = EngineConfigRepo::load_active(&self.pool)
            .await
            .map_err(|e| CoreError::Internal(format!("engine config load failed: {e}")))?;
        let mut policies: HashMap<String, CategoryPolicy> = HashMap::new();
        for row in rows {
            let policy = row.into_policy()?;
            policies.insert(policy.category.clone(), policy);
        }

        let db_config = self.scored(CAT_DB_CONFIG, &policies, self.fetch_db_config()).await;
        let cpu_usage = self
            .scored(CAT_CPU_USAGE, &policies, self.fetch_avg(METRIC_CPU_USAGE))
            .await;
        let io_util = self
            .scored(CAT_IO_UTIL, &policies, self.fetch_avg(METRIC_IO_UTIL))
            .await;
        let disk_capacity = self
            .scored(CAT_DISK_CAPACITY, &policies, self.fetch_max(METRIC_DISK_CAPACITY))
            .await;
        let connection_usage = self
            .scored(
                CAT_CONNECTION_USAGE,
                &policies,
                self.fetch_max(METRIC_CONNECTION_USAGE),
            )
            .await;
        let active_sessions = self
            .scored(
                CAT_ACTIVE_SESSIONS,
                &policies,
                self.fetch_avg(METRIC_ACTIVE_SESSIONS),
            )
            .await;
        let cache_hit = self
            .scored(CAT_CACHE_HIT, &policies, self.fetch_avg(METRIC_CACHE_HIT))
            .await;
        let slow_query = self
            .scored(CAT_SLOW_QUERY, &policies, self.fetch_slow_queries())
            .await;

        // Categories without a configured weight stay out of both the
        // numerator and the denominator; fetch failures stay in at score 0.
        let weighted: Vec<(i16, i16)> = [
            &db_config,
            &cpu_usage,
            &io_util,
            &disk_capacity,
            &connection_usage,
            &active_sessions,
            &cache_hit,
            &slow_query,
        ]
        .iter()
        .filter_map(|(columns, weight)| weight.map(|w| (columns.score, w)))
        .collect();
        let weighted_average_score = scoring::weighted_average(&weighted);

        let new_report = NewReport {
            operation_id: self.operation.id,
            weighted_average_score,
            db_config: db_config.0,
            cpu_usage: cpu_usage.0,
            io_util: io_util.0,
            disk_capacity: disk_capacity.0,
            connection_usage: connection_usage.0,
            active_sessions: active_sessions.0,
            cache_hit: cache_hit.0,
            slow_query: slow_query.0,
        };

        ReportRepo::insert(&self.pool, &new_report)
            .await
            .map_err(|e| CoreError::Internal(format!("report persistence failed: {e}")))
    }

    /// Score one category from its fetch outcome.
    ///
    /// No policy row: excluded from the average, stored as score 0 with a
    /// marker. Fetch failure: scored 0 under its configured weight with
    /// the error as evidence — a single unreachable source must not abort
    /// the run.
    async fn scored<F>(
        &self,
        category: &str,
        policies: &HashMap<String, CategoryPolicy>,
        fetch: F,
    ) -> (CategoryColumns, Option<i16>)
    where
        F: Future<Output = Result<Sample, SourceError>>,
    {
        let Some(policy) = policies.get(category) else {
            return (
                CategoryColumns {
                    score: 0,
                    data: "no policy configured".to_string(),
                    advice: String::new(),
                },
                None,
            );
        };

        let outcome = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.fetch_timeout)),
        };

        match outcome {
            Ok((value, data)) => {
                let (score, evidence) = scoring::score(value, policy);
                let advice = if score < MAX_SCORE {
                    advice_for(category).to_string()
                } else {
                    String::new()
                };
                (
                    CategoryColumns {
                        score,
                        data: format!("{data}; {evidence}"),
                        advice,
                    },
                    Some(policy.weight),
                )
            }
            Err(e) => {
                tracing::warn!(
                    operation_id = self.operation.id,
                    category,
                    error = %e,
                    "metric fetch failed; scoring category as no data",
                );
                (
                    CategoryColumns {
                        score: 0,
                        data: format!("no data: {e}"),
                        advice: advice_for(category).to_string(),
                    },
                    Some(policy.weight),
                )
            }
        }
    }

    /// Deviation count from the recommended variable baseline.
    async fn fetch_db_config(&self) -> Result<Sample, SourceError> {
        let variables = self.sources.variables.global_variables().await?;

        let mut deviations = Vec::new();
        for (name, recommended) in RECOMMENDED_VARIABLES {
            match variables.get(*name) {
                Some(actual) if actual.eq_ignore_ascii_case(recommended) => {}
                Some(actual) => deviations.push(format!("{name}={actual} (want {recommended})")),
                None => deviations.push(format!("{name} unset (want {recommended})")),
            }
        }

        let summary = if deviations.is_empty() {
            format!(
                "all {} recommended settings in place",
                RECOMMENDED_VARIABLES.len()
            )
        } else {
            format!(
                "{} of {} recommended settings deviate: {}",
                deviations.len(),
                RECOMMENDED_VARIABLES.len(),
                deviations.join(", ")
            )
        };
        Ok((deviations.len() as f64, summary))
    }

    async fn fetch_avg(&self, metric: &str) -> Result<Sample, SourceError> {
        let op = &self.operation;
        let value = self
            .sources
            .metrics
            .range_average(metric, op.server_id, op.start_time, op.end_time, op.step_secs)
            .await?;
        Ok((value, format!("avg({metric}) = {value:.2} over window")))
    }

    async fn fetch_max(&self, metric: &str) -> Result<Sample, SourceError> {
        let op = &self.operation;
        let value = self
            .sources
            .metrics
            .range_max(metric, op.server_id, op.start_time, op.end_time, op.step_secs)
            .await?;
        Ok((value, format!("max({metric}) = {value:.2} over window")))
    }

    async fn fetch_slow_queries(&self) -> Result<Sample, SourceError> {
        let op = &self.operation;
        let stats = self
            .sources
            .slow_queries
            .slow_query_stats(op.start_time, op.end_time)
            .await?;
        Ok((
            stats.count as f64,
            format!(
                "{} slow statements in window, worst {:.0} ms",
                stats.count, stats.max_latency_ms
            ),
        ))
    }
}

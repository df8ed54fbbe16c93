//! Lifecycle and engine tests against a real metadata store with mocked
//! external metric sources.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use steward_core::categories::METRIC_CACHE_HIT;
use steward_core::error::CoreError;
use steward_core::types::{DbId, Timestamp};
use steward_db::models::operation::NewOperation;
use steward_db::models::status::OperationStatus;
use steward_db::repositories::OperationRepo;
use steward_healthcheck::{HealthCheckService, MetricSources};
use steward_metrics::{
    MetricsBackend, SlowQuerySource, SlowQueryStats, SourceError, VariableSource,
};

// ---------------------------------------------------------------------------
// Mock metric sources
// ---------------------------------------------------------------------------

/// Variables snapshot matching the recommended baseline exactly.
struct CompliantVariables;

#[async_trait]
impl VariableSource for CompliantVariables {
    async fn global_variables(&self) -> Result<BTreeMap<String, String>, SourceError> {
        Ok(BTreeMap::from([
            ("innodb_flush_log_at_trx_commit".to_string(), "1".to_string()),
            ("sync_binlog".to_string(), "1".to_string()),
            ("slow_query_log".to_string(), "ON".to_string()),
            ("innodb_file_per_table".to_string(), "ON".to_string()),
            ("log_bin".to_string(), "ON".to_string()),
        ]))
    }
}

/// Backend returning fixed healthy values per metric, with an optional
/// metric that always fails to fetch.
struct FixedMetrics {
    failing_metric: Option<&'static str>,
}

impl FixedMetrics {
    fn healthy() -> Self {
        Self {
            failing_metric: None,
        }
    }

    fn failing(metric: &'static str) -> Self {
        Self {
            failing_metric: Some(metric),
        }
    }

    fn value_for(metric: &str) -> f64 {
        match metric {
            "server_cpu_usage_percent" => 30.0,
            "server_io_util_percent" => 25.0,
            "server_disk_used_percent" => 50.0,
            "mysql_connection_usage_percent" => 40.0,
            "mysql_active_sessions" => 8.0,
            "mysql_buffer_pool_hit_percent" => 99.0,
            _ => 0.0,
        }
    }

    fn fetch(&self, metric: &str) -> Result<f64, SourceError> {
        if self.failing_metric == Some(metric) {
            return Err(SourceError::Malformed("backend unreachable".to_string()));
        }
        Ok(Self::value_for(metric))
    }
}

#[async_trait]
impl MetricsBackend for FixedMetrics {
    async fn range_average(
        &self,
        metric: &str,
        _server_id: DbId,
        _start: Timestamp,
        _end: Timestamp,
        _step_secs: i64,
    ) -> Result<f64, SourceError> {
        self.fetch(metric)
    }

    async fn range_max(
        &self,
        metric: &str,
        _server_id: DbId,
        _start: Timestamp,
        _end: Timestamp,
        _step_secs: i64,
    ) -> Result<f64, SourceError> {
        self.fetch(metric)
    }
}

/// No slow statements in the window.
struct QuietSlowQueries;

#[async_trait]
impl SlowQuerySource for QuietSlowQueries {
    async fn slow_query_stats(
        &self,
        _start: Timestamp,
        _end: Timestamp,
    ) -> Result<SlowQueryStats, SourceError> {
        Ok(SlowQueryStats {
            count: 0,
            max_latency_ms: 0.0,
        })
    }
}

fn sources(metrics: FixedMetrics) -> MetricSources {
    MetricSources {
        variables: Arc::new(CompliantVariables),
        metrics: Arc::new(metrics),
        slow_queries: Arc::new(QuietSlowQueries),
    }
}

fn service(pool: PgPool, metrics: FixedMetrics) -> HealthCheckService {
    HealthCheckService::new(pool, sources(metrics)).with_fetch_timeout(Duration::from_secs(5))
}

fn trigger(server_id: DbId) -> NewOperation {
    let start = Utc::now() - chrono::Duration::hours(3);
    NewOperation {
        server_id,
        start_time: start,
        end_time: Utc::now(),
        step_secs: 60,
    }
}

/// Poll until the operation reaches a terminal status.
async fn wait_until_terminal(
    svc: &HealthCheckService,
    operation_id: DbId,
) -> OperationStatus {
    for _ in 0..200 {
        let op = svc.get_operation(operation_id).await.unwrap();
        if let Some(status) = OperationStatus::from_id(op.status_id) {
            if status.is_terminal() {
                return status;
            }
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("operation {operation_id} never reached a terminal status");
}

// ---------------------------------------------------------------------------
// Trigger validation and conflict handling
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn rejects_empty_window(pool: PgPool) {
    let svc = service(pool, FixedMetrics::healthy());
    let now = Utc::now();
    let input = NewOperation {
        server_id: 1,
        start_time: now,
        end_time: now,
        step_secs: 60,
    };
    assert_matches!(svc.check(&input).await, Err(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rejects_non_positive_step(pool: PgPool) {
    let svc = service(pool, FixedMetrics::healthy());
    let mut input = trigger(1);
    input.step_secs = 0;
    assert_matches!(svc.check(&input).await, Err(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn second_trigger_while_in_flight_conflicts(pool: PgPool) {
    let svc = service(pool, FixedMetrics::healthy());
    // First operation stays Pending: inserted without spawning an engine.
    svc.init_operation(&trigger(1)).await.unwrap();

    assert_matches!(svc.check(&trigger(1)).await, Err(CoreError::Conflict(_)));
    // A different server is unaffected.
    assert!(svc.init_operation(&trigger(2)).await.is_ok());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn is_running_tracks_in_flight_state(pool: PgPool) {
    let svc = service(pool, FixedMetrics::healthy());
    assert!(!svc.is_running(1).await.unwrap());

    let op = svc.init_operation(&trigger(1)).await.unwrap();
    assert!(svc.is_running(1).await.unwrap());

    svc.update_operation_status(op.id, OperationStatus::Failed, Some("aborted"))
        .await
        .unwrap();
    assert!(!svc.is_running(1).await.unwrap());
}

// ---------------------------------------------------------------------------
// Status transition table
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn transition_table_is_enforced(pool: PgPool) {
    let svc = service(pool, FixedMetrics::healthy());
    let op = svc.init_operation(&trigger(1)).await.unwrap();

    // Pending -> Completed skips Running.
    assert_matches!(
        svc.update_operation_status(op.id, OperationStatus::Completed, None)
            .await,
        Err(CoreError::InvalidTransition { .. })
    );

    svc.update_operation_status(op.id, OperationStatus::Running, None)
        .await
        .unwrap();
    svc.update_operation_status(op.id, OperationStatus::Completed, None)
        .await
        .unwrap();

    // Terminal states are immutable.
    assert_matches!(
        svc.update_operation_status(op.id, OperationStatus::Running, None)
            .await,
        Err(CoreError::InvalidTransition { .. })
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn stale_status_snapshot_cannot_transition(pool: PgPool) {
    let svc = service(pool.clone(), FixedMetrics::healthy());
    let op = svc.init_operation(&trigger(1)).await.unwrap();

    // Two writers race the same Pending snapshot: the conditional update
    // matches the row for exactly one of them.
    let winner = OperationRepo::update_status(
        &pool,
        op.id,
        OperationStatus::Pending,
        OperationStatus::Running,
        None,
    )
    .await
    .unwrap();
    assert!(winner.is_some());

    let loser = OperationRepo::update_status(
        &pool,
        op.id,
        OperationStatus::Pending,
        OperationStatus::Running,
        None,
    )
    .await
    .unwrap();
    assert!(loser.is_none());

    // Through the service the loser surfaces as InvalidTransition against
    // the status that actually won.
    assert_matches!(
        svc.update_operation_status(op.id, OperationStatus::Running, None)
            .await,
        Err(CoreError::InvalidTransition { .. })
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn transition_on_missing_operation_is_not_found(pool: PgPool) {
    let svc = service(pool, FixedMetrics::healthy());
    assert_matches!(
        svc.update_operation_status(9999, OperationStatus::Running, None)
            .await,
        Err(CoreError::NotFound { .. })
    );
}

// ---------------------------------------------------------------------------
// End-to-end engine runs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn check_produces_completed_report(pool: PgPool) {
    let svc = service(pool, FixedMetrics::healthy());
    let operation_id = svc.check(&trigger(1)).await.unwrap();

    assert_eq!(
        wait_until_terminal(&svc, operation_id).await,
        OperationStatus::Completed
    );

    let report = svc.get_report_by_operation_id(operation_id).await.unwrap();
    // All mocked values sit inside their watermark bands.
    assert_eq!(report.weighted_average_score, 100);
    assert_eq!(report.db_config_score, 100);
    assert_eq!(report.cpu_usage_score, 100);
    assert_eq!(report.io_util_score, 100);
    assert_eq!(report.disk_capacity_score, 100);
    assert_eq!(report.connection_usage_score, 100);
    assert_eq!(report.active_sessions_score, 100);
    assert_eq!(report.cache_hit_score, 100);
    assert_eq!(report.slow_query_score, 100);
    assert_eq!(report.accurate_review, 0);

    // The server is free for the next check once the run completed.
    assert!(!svc.is_running(1).await.unwrap());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn fetch_failure_is_non_fatal(pool: PgPool) {
    let svc = service(pool, FixedMetrics::failing(METRIC_CACHE_HIT));
    let operation_id = svc.check(&trigger(1)).await.unwrap();

    assert_eq!(
        wait_until_terminal(&svc, operation_id).await,
        OperationStatus::Completed
    );

    let report = svc.get_report_by_operation_id(operation_id).await.unwrap();
    // The failed category scores 0 with the error recorded as evidence...
    assert_eq!(report.cache_hit_score, 0);
    assert!(report.cache_hit_data.starts_with("no data:"));
    assert!(!report.cache_hit_advice.is_empty());
    // ...while the other seven categories are scored normally and the
    // failed category's weight (10 of 100) stays in the denominator.
    assert_eq!(report.cpu_usage_score, 100);
    assert_eq!(report.weighted_average_score, 90);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn corrupt_policy_config_fails_the_operation(pool: PgPool) {
    // An unparseable penalty mode makes the config load fatal: unlike a
    // single unreachable source, the run cannot score anything.
    sqlx::query("UPDATE hc_engine_configs SET penalty_mode = 'sideways' WHERE category = 'cpu_usage'")
        .execute(&pool)
        .await
        .unwrap();

    let svc = service(pool, FixedMetrics::healthy());
    let operation_id = svc.check(&trigger(1)).await.unwrap();

    assert_eq!(
        wait_until_terminal(&svc, operation_id).await,
        OperationStatus::Failed
    );

    // The failure reason lands on the operation row, no report exists,
    // and the server is free for another attempt.
    let op = svc.get_operation(operation_id).await.unwrap();
    assert!(op.message.is_some());
    assert_matches!(
        svc.get_report_by_operation_id(operation_id).await,
        Err(CoreError::NotFound { .. })
    );
    assert!(!svc.is_running(1).await.unwrap());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unconfigured_category_is_excluded_from_average(pool: PgPool) {
    // Drop the slow_query policy: category loses its weight entirely.
    sqlx::query("DELETE FROM hc_engine_configs WHERE category = 'slow_query'")
        .execute(&pool)
        .await
        .unwrap();

    let svc = service(pool, FixedMetrics::healthy());
    let operation_id = svc.check(&trigger(1)).await.unwrap();

    assert_eq!(
        wait_until_terminal(&svc, operation_id).await,
        OperationStatus::Completed
    );

    let report = svc.get_report_by_operation_id(operation_id).await.unwrap();
    assert_eq!(report.slow_query_score, 0);
    assert_eq!(report.slow_query_data, "no policy configured");
    // Remaining categories all score 100, so excluding the unweighted one
    // leaves the average at 100 rather than dragging it down.
    assert_eq!(report.weighted_average_score, 100);
}

// ---------------------------------------------------------------------------
// Report retrieval and review
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn report_lookup_misses_before_completion(pool: PgPool) {
    let svc = service(pool, FixedMetrics::healthy());
    let op = svc.init_operation(&trigger(1)).await.unwrap();

    assert_matches!(
        svc.get_report_by_operation_id(op.id).await,
        Err(CoreError::NotFound { .. })
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn review_on_missing_operation_is_not_found(pool: PgPool) {
    let svc = service(pool, FixedMetrics::healthy());
    assert_matches!(
        svc.review_accurate(424242, 1).await,
        Err(CoreError::NotFound { .. })
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn review_updates_completed_report(pool: PgPool) {
    let svc = service(pool, FixedMetrics::healthy());
    let operation_id = svc.check(&trigger(1)).await.unwrap();
    wait_until_terminal(&svc, operation_id).await;

    svc.review_accurate(operation_id, 1).await.unwrap();

    let report = svc.get_report_by_operation_id(operation_id).await.unwrap();
    assert_eq!(report.accurate_review, 1);
}

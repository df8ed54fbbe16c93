use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use steward_api::config::ServerConfig;
use steward_api::router::build_app_router;
use steward_api::state::AppState;
use steward_core::types::{DbId, Timestamp};
use steward_healthcheck::{HealthCheckService, MetricSources};
use steward_metrics::{
    MetricsBackend, SlowQuerySource, SlowQueryStats, SourceError, VariableSource,
};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout. The external source URLs are never
/// dialed in tests; the app is built with mock sources.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        fetch_timeout_secs: 5,
        metrics_backend_url: "http://localhost:9090".to_string(),
        target_mysql_url: "mysql://unused".to_string(),
    }
}

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

/// Backend returning fixed healthy values per metric.
struct HealthyMetrics;

impl HealthyMetrics {
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
}

#[async_trait]
impl MetricsBackend for HealthyMetrics {
    async fn range_average(
        &self,
        metric: &str,
        _server_id: DbId,
        _start: Timestamp,
        _end: Timestamp,
        _step_secs: i64,
    ) -> Result<f64, SourceError> {
        Ok(Self::value_for(metric))
    }

    async fn range_max(
        &self,
        metric: &str,
        _server_id: DbId,
        _start: Timestamp,
        _end: Timestamp,
        _step_secs: i64,
    ) -> Result<f64, SourceError> {
        Ok(Self::value_for(metric))
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

fn mock_sources() -> MetricSources {
    MetricSources {
        variables: Arc::new(CompliantVariables),
        metrics: Arc::new(HealthyMetrics),
        slow_queries: Arc::new(QuietSlowQueries),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and mocked external metric sources.
///
/// This calls the same `build_app_router` as `main.rs`, so integration
/// tests exercise the same middleware stack (CORS, request ID, timeout,
/// tracing, panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();

    let healthcheck = HealthCheckService::new(pool.clone(), mock_sources())
        .with_fetch_timeout(std::time::Duration::from_secs(config.fetch_timeout_secs));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        healthcheck: Arc::new(healthcheck),
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a GET request to the app and return the raw response.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with a JSON body and return the raw response.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll an operation until it reaches a terminal status, returning the
/// final status ID. Panics if the operation is still in flight after ~5s.
pub async fn wait_until_terminal(app: &Router, operation_id: i64) -> i64 {
    for _ in 0..50 {
        let response = get(
            app.clone(),
            &format!("/api/v1/healthchecks/operations/{operation_id}"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let status_id = json["data"]["status_id"].as_i64().unwrap();
        if status_id == 3 || status_id == 4 {
            return status_id;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("operation {operation_id} did not reach a terminal status");
}

//! Capability traits for the three external metric sources.

use std::collections::BTreeMap;

use async_trait::async_trait;
use steward_core::types::{DbId, Timestamp};

use crate::error::SourceError;

/// Point-in-time configuration snapshot of the monitored server.
#[async_trait]
pub trait VariableSource: Send + Sync {
    /// Fetch the server's global variables as a key/value map.
    async fn global_variables(&self) -> Result<BTreeMap<String, String>, SourceError>;
}

/// Window aggregates from the operational metrics backend.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Average of `metric` for `server_id` over `[start, end]` at `step_secs`.
    async fn range_average(
        &self,
        metric: &str,
        server_id: DbId,
        start: Timestamp,
        end: Timestamp,
        step_secs: i64,
    ) -> Result<f64, SourceError>;

    /// Maximum of `metric` for `server_id` over `[start, end]` at `step_secs`.
    async fn range_max(
        &self,
        metric: &str,
        server_id: DbId,
        start: Timestamp,
        end: Timestamp,
        step_secs: i64,
    ) -> Result<f64, SourceError>;
}

/// Slow-query aggregates over a time window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlowQueryStats {
    /// Statement executions observed in the window.
    pub count: i64,
    /// Worst single statement latency, in milliseconds.
    pub max_latency_ms: f64,
}

/// Slow-query profile from the monitored target.
#[async_trait]
pub trait SlowQuerySource: Send + Sync {
    async fn slow_query_stats(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<SlowQueryStats, SourceError>;
}

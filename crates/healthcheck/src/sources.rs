//! Bundle of the three external metric sources the engine draws from.

use std::sync::Arc;

use steward_metrics::{MetricsBackend, SlowQuerySource, VariableSource};

/// Shared handles to the external metric sources. Cheaply cloneable; one
/// bundle is shared by every engine run.
#[derive(Clone)]
pub struct MetricSources {
    /// Configuration snapshot of the monitored server.
    pub variables: Arc<dyn VariableSource>,
    /// Operational metrics backend (window aggregates).
    pub metrics: Arc<dyn MetricsBackend>,
    /// Slow-query profile of the monitored server.
    pub slow_queries: Arc<dyn SlowQuerySource>,
}

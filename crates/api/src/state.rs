use std::sync::Arc;

use steward_healthcheck::HealthCheckService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`. Cheaply cloneable (inner data is behind `Arc` or is
/// already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Metadata store connection pool.
    pub pool: steward_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Health-check lifecycle manager.
    pub healthcheck: Arc<HealthCheckService>,
}

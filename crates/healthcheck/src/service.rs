//! Operation lifecycle management.
//!
//! The service is the only entry point for triggering checks: it guards
//! the one-in-flight-per-server invariant at the persistence layer,
//! spawns the engine, and serves status / report / review lookups.

use std::sync::Arc;
use std::time::Duration;

use steward_core::categories::{validate_step, validate_window};
use steward_core::error::CoreError;
use steward_core::types::DbId;
use steward_db::models::operation::{NewOperation, Operation};
use steward_db::models::report::Report;
use steward_db::models::status::OperationStatus;
use steward_db::repositories::{OperationRepo, ReportRepo};
use steward_db::DbPool;

use crate::engine::{DefaultEngine, Engine, DEFAULT_FETCH_TIMEOUT};
use crate::sources::MetricSources;

/// Builds the engine for one operation. Swappable so alternate scoring
/// strategies can run behind the same lifecycle manager.
pub type EngineFactory =
    Arc<dyn Fn(DbPool, MetricSources, Operation, Duration) -> Box<dyn Engine> + Send + Sync>;

/// Lifecycle manager for health-check operations.
#[derive(Clone)]
pub struct HealthCheckService {
    pool: DbPool,
    sources: MetricSources,
    fetch_timeout: Duration,
    engine_factory: EngineFactory,
}

impl HealthCheckService {
    /// Create a service running the standard watermark-scoring engine.
    pub fn new(pool: DbPool, sources: MetricSources) -> Self {
        Self::with_engine_factory(
            pool,
            sources,
            Arc::new(|pool, sources, operation, timeout| {
                Box::new(DefaultEngine::new(pool, sources, operation, timeout))
            }),
        )
    }

    /// Create a service with a substitute engine implementation.
    pub fn with_engine_factory(
        pool: DbPool,
        sources: MetricSources,
        engine_factory: EngineFactory,
    ) -> Self {
        Self {
            pool,
            sources,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            engine_factory,
        }
    }

    /// Override the per-category fetch budget.
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Trigger a health check.
    ///
    /// Validates the window and step, durably records the Pending
    /// operation (rejecting with `Conflict` if one is already in flight
    /// for the server), then spawns the engine and returns the operation
    /// ID immediately — the caller never waits for scoring.
    pub async fn check(&self, input: &NewOperation) -> Result<DbId, CoreError> {
        validate_window(input.start_time, input.end_time)?;
        validate_step(input.step_secs)?;

        let operation = self.init_operation(input).await?;

        let engine = (self.engine_factory)(
            self.pool.clone(),
            self.sources.clone(),
            operation.clone(),
            self.fetch_timeout,
        );
        tokio::spawn(engine.run());

        tracing::info!(
            operation_id = operation.id,
            server_id = input.server_id,
            "health check operation started",
        );
        Ok(operation.id)
    }

    /// Insert the Pending operation, mapping the in-flight unique-index
    /// conflict to `Conflict`. Race-free under concurrent callers: the
    /// check-then-insert happens inside the database.
    pub async fn init_operation(&self, input: &NewOperation) -> Result<Operation, CoreError> {
        match OperationRepo::create_in_flight(&self.pool, input)
            .await
            .map_err(internal)?
        {
            Some(operation) => Ok(operation),
            None => Err(CoreError::Conflict(format!(
                "a health check is already running for server {}",
                input.server_id
            ))),
        }
    }

    /// Whether a Pending/Running operation exists for the server.
    pub async fn is_running(&self, server_id: DbId) -> Result<bool, CoreError> {
        OperationRepo::has_in_flight(&self.pool, server_id)
            .await
            .map_err(internal)
    }

    /// Fetch an operation for status polling.
    pub async fn get_operation(&self, operation_id: DbId) -> Result<Operation, CoreError> {
        OperationRepo::find_by_id(&self.pool, operation_id)
            .await
            .map_err(internal)?
            .ok_or(CoreError::NotFound {
                entity: "Operation",
                id: operation_id,
            })
    }

    /// Fetch the persisted report for a completed operation.
    pub async fn get_report_by_operation_id(&self, operation_id: DbId) -> Result<Report, CoreError> {
        ReportRepo::find_by_operation_id(&self.pool, operation_id)
            .await
            .map_err(internal)?
            .ok_or(CoreError::NotFound {
                entity: "Report",
                id: operation_id,
            })
    }

    /// Record human feedback on a report's accuracy.
    ///
    /// `NotFound` if the operation has no report yet (not completed, or
    /// never existed). Creates nothing on a miss.
    pub async fn review_accurate(&self, operation_id: DbId, review: i16) -> Result<(), CoreError> {
        let updated = ReportRepo::set_accurate_review(&self.pool, operation_id, review)
            .await
            .map_err(internal)?;
        if !updated {
            return Err(CoreError::NotFound {
                entity: "Report",
                id: operation_id,
            });
        }
        tracing::info!(operation_id, review, "report accuracy reviewed");
        Ok(())
    }

    /// Transition an operation's status, enforcing the transition table.
    ///
    /// The write is conditional on the status observed here, so two
    /// concurrent callers racing through the legality check cannot both
    /// apply their transition: the loser's snapshot no longer matches and
    /// it gets `InvalidTransition` against the current status.
    pub async fn update_operation_status(
        &self,
        operation_id: DbId,
        to: OperationStatus,
        message: Option<&str>,
    ) -> Result<Operation, CoreError> {
        let operation = self.get_operation(operation_id).await?;
        let from = OperationStatus::from_id(operation.status_id).ok_or_else(|| {
            CoreError::Internal(format!(
                "operation {operation_id} has unknown status id {}",
                operation.status_id
            ))
        })?;

        if !from.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: from.name(),
                to: to.name(),
            });
        }

        match OperationRepo::update_status(&self.pool, operation_id, from, to, message)
            .await
            .map_err(internal)?
        {
            Some(operation) => Ok(operation),
            // No row matched: either the operation vanished, or a
            // concurrent transition won the race. Re-read to tell apart.
            None => {
                let current = self.get_operation(operation_id).await?;
                let current_status =
                    OperationStatus::from_id(current.status_id).map(OperationStatus::name);
                Err(CoreError::InvalidTransition {
                    from: current_status.unwrap_or("unknown"),
                    to: to.name(),
                })
            }
        }
    }
}

fn internal(e: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("database error: {e}"))
}

//! Repository for the `hc_operations` table.
//!
//! The one-in-flight-operation-per-server invariant is enforced by the
//! partial unique index `uq_hc_operations_in_flight`, not by in-process
//! locking, so it holds across concurrent callers, restarts, and multiple
//! service instances.

use sqlx::PgPool;
use steward_core::types::{DbId, Timestamp};

use crate::models::operation::{NewOperation, Operation};
use crate::models::status::OperationStatus;

/// Column list for `hc_operations` queries.
const COLUMNS: &str = "id, server_id, start_time, end_time, step_secs, \
    status_id, message, created_at, updated_at";

/// Constraint backing the one-in-flight-per-server invariant.
const IN_FLIGHT_CONSTRAINT: &str = "uq_hc_operations_in_flight";

/// Provides persistence for health-check operations.
pub struct OperationRepo;

impl OperationRepo {
    /// Insert a new Pending operation for the target server.
    ///
    /// Returns `Ok(None)` when a Pending/Running operation already exists
    /// for the server — the unique-index violation is the atomic
    /// check-then-insert, so two racing callers cannot both succeed.
    pub async fn create_in_flight(
        pool: &PgPool,
        input: &NewOperation,
    ) -> Result<Option<Operation>, sqlx::Error> {
        let query = format!(
            "INSERT INTO hc_operations (server_id, start_time, end_time, step_secs, status_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let result = sqlx::query_as::<_, Operation>(&query)
            .bind(input.server_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.step_secs)
            .bind(OperationStatus::Pending.id())
            .fetch_one(pool)
            .await;

        match result {
            Ok(op) => Ok(Some(op)),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some("23505")
                    && db_err.constraint() == Some(IN_FLIGHT_CONSTRAINT) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Find an operation by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Operation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM hc_operations WHERE id = $1");
        sqlx::query_as::<_, Operation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a Pending/Running operation exists for the server.
    pub async fn has_in_flight(pool: &PgPool, server_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM hc_operations \
                 WHERE server_id = $1 AND status_id IN ($2, $3) \
             )",
        )
        .bind(server_id)
        .bind(OperationStatus::Pending.id())
        .bind(OperationStatus::Running.id())
        .fetch_one(pool)
        .await
    }

    /// Transition the operation from `from` to `to` (with optional
    /// message), returning the updated row.
    ///
    /// The `status_id = from` predicate makes the transition conditional
    /// inside the database: of two racing callers holding the same
    /// snapshot, exactly one matches the row. `Ok(None)` means the row is
    /// missing or its status no longer equals `from`. Transition-table
    /// legality is still the caller's responsibility.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        from: OperationStatus,
        to: OperationStatus,
        message: Option<&str>,
    ) -> Result<Option<Operation>, sqlx::Error> {
        let query = format!(
            "UPDATE hc_operations \
             SET status_id = $3, message = COALESCE($4, message), updated_at = NOW() \
             WHERE id = $1 AND status_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Operation>(&query)
            .bind(id)
            .bind(from.id())
            .bind(to.id())
            .bind(message)
            .fetch_optional(pool)
            .await
    }

    /// Operations stuck in Running since before `cutoff`, oldest first.
    /// Used by the stale-operation janitor.
    pub async fn list_running_older_than(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<Operation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM hc_operations \
             WHERE status_id = $1 AND updated_at < $2 \
             ORDER BY updated_at ASC"
        );
        sqlx::query_as::<_, Operation>(&query)
            .bind(OperationStatus::Running.id())
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }
}

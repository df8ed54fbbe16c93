//! Health-check operation models: one row per requested run.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use steward_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `hc_operations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Operation {
    pub id: DbId,
    pub server_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Sampling step in seconds.
    pub step_secs: i64,
    pub status_id: StatusId,
    /// Populated on failure.
    pub message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for triggering a check via `POST /api/v1/healthchecks`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOperation {
    pub server_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub step_secs: i64,
}

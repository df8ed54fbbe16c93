//! Domain error taxonomy shared across the workspace.

use crate::types::DbId;

/// Domain-level errors. HTTP mapping lives in `steward-api`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup missed.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Input validation failed before any persistence.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request conflicts with current state (e.g. a health check
    /// is already in flight for the target server).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An operation status transition outside the allowed table.
    #[error("Invalid operation status transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Anything unexpected (database failures, config load failures).
    #[error("Internal error: {0}")]
    Internal(String),
}

//! Errors from the metric-source layer.
//!
//! These are always non-fatal to a health-check run: the engine records
//! them as per-category evidence and keeps going.

use std::time::Duration;

/// Errors from fetching raw metrics out of an external source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A query against the monitored target failed.
    #[error("target query failed: {0}")]
    Sql(#[from] sqlx::Error),

    /// The fetch exceeded its per-category budget.
    #[error("metric fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The source answered, but not in a shape we can use.
    #[error("malformed metrics response: {0}")]
    Malformed(String),
}

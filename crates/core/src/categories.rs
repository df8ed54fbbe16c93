//! Well-known health-check category keys, metric names, and advice text.
//!
//! These are the canonical category keys used in the `hc_engine_configs`
//! table, the scoring engine, and the `hc_reports` columns.

use crate::error::CoreError;
use crate::types::Timestamp;

/// Database configuration snapshot (deviations from recommended settings).
pub const CAT_DB_CONFIG: &str = "db_config";
/// Host CPU usage percentage over the window.
pub const CAT_CPU_USAGE: &str = "cpu_usage";
/// Block device I/O utilization percentage over the window.
pub const CAT_IO_UTIL: &str = "io_util";
/// Data directory disk capacity usage percentage.
pub const CAT_DISK_CAPACITY: &str = "disk_capacity";
/// Connection usage as a percentage of `max_connections`.
pub const CAT_CONNECTION_USAGE: &str = "connection_usage";
/// Average active session count over the window.
pub const CAT_ACTIVE_SESSIONS: &str = "active_sessions";
/// InnoDB buffer pool cache hit ratio (0-100).
pub const CAT_CACHE_HIT: &str = "cache_hit";
/// Slow query count over the window.
pub const CAT_SLOW_QUERY: &str = "slow_query";

/// All scorable categories, in report column order.
pub const ALL_CATEGORIES: [&str; 8] = [
    CAT_DB_CONFIG,
    CAT_CPU_USAGE,
    CAT_IO_UTIL,
    CAT_DISK_CAPACITY,
    CAT_CONNECTION_USAGE,
    CAT_ACTIVE_SESSIONS,
    CAT_CACHE_HIT,
    CAT_SLOW_QUERY,
];

// ---------------------------------------------------------------------------
// Metric names in the operational metrics backend
// ---------------------------------------------------------------------------

/// Host CPU usage percentage (0-100).
pub const METRIC_CPU_USAGE: &str = "server_cpu_usage_percent";
/// Block device I/O utilization percentage (0-100).
pub const METRIC_IO_UTIL: &str = "server_io_util_percent";
/// Data directory disk usage percentage (0-100).
pub const METRIC_DISK_CAPACITY: &str = "server_disk_used_percent";
/// Connected threads as a percentage of `max_connections`.
pub const METRIC_CONNECTION_USAGE: &str = "mysql_connection_usage_percent";
/// Active (non-sleeping) session count.
pub const METRIC_ACTIVE_SESSIONS: &str = "mysql_active_sessions";
/// Buffer pool hit ratio as a percentage (0-100).
pub const METRIC_CACHE_HIT: &str = "mysql_buffer_pool_hit_percent";

// ---------------------------------------------------------------------------
// Advice text
// ---------------------------------------------------------------------------

/// Canned advice attached to a category when its score was deducted.
pub fn advice_for(category: &str) -> &'static str {
    match category {
        CAT_DB_CONFIG => {
            "Review flagged server variables against the recommended baseline."
        }
        CAT_CPU_USAGE => {
            "Sustained CPU pressure; profile top statements or scale the host."
        }
        CAT_IO_UTIL => {
            "I/O saturation; check redo/binlog flushing and storage throughput."
        }
        CAT_DISK_CAPACITY => {
            "Data directory is filling up; archive or extend the volume."
        }
        CAT_CONNECTION_USAGE => {
            "Connection pool near max_connections; raise the limit or pool clients."
        }
        CAT_ACTIVE_SESSIONS => {
            "High concurrent active sessions; look for lock contention or slow plans."
        }
        CAT_CACHE_HIT => {
            "Buffer pool hit ratio is low; consider a larger innodb_buffer_pool_size."
        }
        CAT_SLOW_QUERY => "Slow queries detected; inspect the statement digest report.",
        _ => "",
    }
}

// ---------------------------------------------------------------------------
// Trigger input validation
// ---------------------------------------------------------------------------

/// Validate that a sampling window is non-empty.
pub fn validate_window(start: Timestamp, end: Timestamp) -> Result<(), CoreError> {
    if start >= end {
        return Err(CoreError::Validation(format!(
            "start_time ({start}) must be before end_time ({end})"
        )));
    }
    Ok(())
}

/// Validate that a sampling step is positive.
pub fn validate_step(step_secs: i64) -> Result<(), CoreError> {
    if step_secs <= 0 {
        return Err(CoreError::Validation(format!(
            "step_secs must be positive, got {step_secs}"
        )));
    }
    Ok(())
}

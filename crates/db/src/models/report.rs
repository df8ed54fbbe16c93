//! Composite health report models.
//!
//! A report is written once at the end of a successful engine run and is
//! append-only afterwards: the only mutable column is `accurate_review`,
//! updated through `ReportRepo::set_accurate_review`. There is no generic
//! field setter.

use serde::Serialize;
use sqlx::FromRow;
use steward_core::types::{DbId, Timestamp};

/// A row from the `hc_reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: DbId,
    pub operation_id: DbId,
    pub weighted_average_score: i16,

    pub db_config_score: i16,
    pub db_config_data: String,
    pub db_config_advice: String,

    pub cpu_usage_score: i16,
    pub cpu_usage_data: String,
    pub cpu_usage_advice: String,

    pub io_util_score: i16,
    pub io_util_data: String,
    pub io_util_advice: String,

    pub disk_capacity_score: i16,
    pub disk_capacity_data: String,
    pub disk_capacity_advice: String,

    pub connection_usage_score: i16,
    pub connection_usage_data: String,
    pub connection_usage_advice: String,

    pub active_sessions_score: i16,
    pub active_sessions_data: String,
    pub active_sessions_advice: String,

    pub cache_hit_score: i16,
    pub cache_hit_data: String,
    pub cache_hit_advice: String,

    pub slow_query_score: i16,
    pub slow_query_data: String,
    pub slow_query_advice: String,

    /// Human feedback: 0 = unreviewed.
    pub accurate_review: i16,
    pub del_flag: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One category's columns in a new report.
#[derive(Debug, Clone, Default)]
pub struct CategoryColumns {
    pub score: i16,
    pub data: String,
    pub advice: String,
}

/// Insert payload for `hc_reports`, grouped by category to keep the
/// repository signature sane.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub operation_id: DbId,
    pub weighted_average_score: i16,
    pub db_config: CategoryColumns,
    pub cpu_usage: CategoryColumns,
    pub io_util: CategoryColumns,
    pub disk_capacity: CategoryColumns,
    pub connection_usage: CategoryColumns,
    pub active_sessions: CategoryColumns,
    pub cache_hit: CategoryColumns,
    pub slow_query: CategoryColumns,
}

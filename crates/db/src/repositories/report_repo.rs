//! Repository for the `hc_reports` table.

use sqlx::PgPool;
use steward_core::types::DbId;

use crate::models::report::{NewReport, Report};

/// Column list for `hc_reports` queries.
const COLUMNS: &str = "id, operation_id, weighted_average_score, \
    db_config_score, db_config_data, db_config_advice, \
    cpu_usage_score, cpu_usage_data, cpu_usage_advice, \
    io_util_score, io_util_data, io_util_advice, \
    disk_capacity_score, disk_capacity_data, disk_capacity_advice, \
    connection_usage_score, connection_usage_data, connection_usage_advice, \
    active_sessions_score, active_sessions_data, active_sessions_advice, \
    cache_hit_score, cache_hit_data, cache_hit_advice, \
    slow_query_score, slow_query_data, slow_query_advice, \
    accurate_review, del_flag, created_at, updated_at";

/// Provides persistence for composite health reports.
pub struct ReportRepo;

impl ReportRepo {
    /// Insert a report for a completed operation, returning the row.
    ///
    /// Written exactly once per operation (`operation_id` is unique);
    /// every column except `accurate_review` is immutable afterwards.
    pub async fn insert(pool: &PgPool, report: &NewReport) -> Result<Report, sqlx::Error> {
        let query = format!(
            "INSERT INTO hc_reports (operation_id, weighted_average_score, \
                 db_config_score, db_config_data, db_config_advice, \
                 cpu_usage_score, cpu_usage_data, cpu_usage_advice, \
                 io_util_score, io_util_data, io_util_advice, \
                 disk_capacity_score, disk_capacity_data, disk_capacity_advice, \
                 connection_usage_score, connection_usage_data, connection_usage_advice, \
                 active_sessions_score, active_sessions_data, active_sessions_advice, \
                 cache_hit_score, cache_hit_data, cache_hit_advice, \
                 slow_query_score, slow_query_data, slow_query_advice) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                     $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(report.operation_id)
            .bind(report.weighted_average_score)
            .bind(report.db_config.score)
            .bind(&report.db_config.data)
            .bind(&report.db_config.advice)
            .bind(report.cpu_usage.score)
            .bind(&report.cpu_usage.data)
            .bind(&report.cpu_usage.advice)
            .bind(report.io_util.score)
            .bind(&report.io_util.data)
            .bind(&report.io_util.advice)
            .bind(report.disk_capacity.score)
            .bind(&report.disk_capacity.data)
            .bind(&report.disk_capacity.advice)
            .bind(report.connection_usage.score)
            .bind(&report.connection_usage.data)
            .bind(&report.connection_usage.advice)
            .bind(report.active_sessions.score)
            .bind(&report.active_sessions.data)
            .bind(&report.active_sessions.advice)
            .bind(report.cache_hit.score)
            .bind(&report.cache_hit.data)
            .bind(&report.cache_hit.advice)
            .bind(report.slow_query.score)
            .bind(&report.slow_query.data)
            .bind(&report.slow_query.advice)
            .fetch_one(pool)
            .await
    }

    /// Find the report for an operation.
    pub async fn find_by_operation_id(
        pool: &PgPool,
        operation_id: DbId,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM hc_reports \
             WHERE operation_id = $1 AND NOT del_flag"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(operation_id)
            .fetch_optional(pool)
            .await
    }

    /// Record human feedback on report accuracy. The single mutable column.
    ///
    /// Returns `false` if no report exists for the operation.
    pub async fn set_accurate_review(
        pool: &PgPool,
        operation_id: DbId,
        review: i16,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE hc_reports \
             SET accurate_review = $2, updated_at = NOW() \
             WHERE operation_id = $1 AND NOT del_flag",
        )
        .bind(operation_id)
        .bind(review)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

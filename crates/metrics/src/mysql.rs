//! Client for the monitored MySQL target.
//!
//! Serves two capability traits: the configuration snapshot
//! (`SHOW GLOBAL VARIABLES`) and the slow-query profile (statement digest
//! summary from `performance_schema`).

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySqlPool, Row};
use steward_core::types::Timestamp;

use crate::error::SourceError;
use crate::source::{SlowQuerySource, SlowQueryStats, VariableSource};

/// Statements averaging at or above this latency count as slow.
/// `performance_schema` timers are in picoseconds; this is one second.
const SLOW_LATENCY_PS: i64 = 1_000_000_000_000;

/// Connection handle to a monitored MySQL server.
///
/// Uses a small dedicated pool — diagnostic queries must not compete with
/// the metadata store's pool, and the target may be under pressure (that
/// is usually why it is being checked).
pub struct MySqlTarget {
    pool: MySqlPool,
}

impl MySqlTarget {
    /// Connect to the monitored server.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = MySqlPoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests and embedding callers).
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VariableSource for MySqlTarget {
    async fn global_variables(&self) -> Result<BTreeMap<String, String>, SourceError> {
        let rows = sqlx::query("SHOW GLOBAL VARIABLES")
            .fetch_all(&self.pool)
            .await?;

        let mut variables = BTreeMap::new();
        for row in rows {
            let name: String = row.try_get(0)?;
            let value: String = row.try_get(1).unwrap_or_default();
            variables.insert(name, value);
        }
        Ok(variables)
    }
}

#[async_trait]
impl SlowQuerySource for MySqlTarget {
    /// Slow-statement aggregates from the digest summary.
    ///
    /// The digest table only carries `FIRST_SEEN`/`LAST_SEEN`, so the
    /// window filter on `LAST_SEEN` approximates "active in window".
    async fn slow_query_stats(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<SlowQueryStats, SourceError> {
        let row = sqlx::query(
            "SELECT CAST(COALESCE(SUM(COUNT_STAR), 0) AS SIGNED) AS slow_count, \
                    CAST(COALESCE(MAX(MAX_TIMER_WAIT), 0) / 1000000000 AS DOUBLE) AS max_latency_ms \
             FROM performance_schema.events_statements_summary_by_digest \
             WHERE AVG_TIMER_WAIT >= ? \
               AND LAST_SEEN >= ? AND LAST_SEEN < ?",
        )
        .bind(SLOW_LATENCY_PS)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(SlowQueryStats {
            count: row.try_get("slow_count")?,
            max_latency_ms: row.try_get("max_latency_ms")?,
        })
    }
}

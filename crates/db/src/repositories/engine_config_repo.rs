//! Repository for the `hc_engine_configs` table.

use sqlx::PgPool;

use crate::models::engine_config::EngineConfigRow;

/// Column list for `hc_engine_configs` queries.
const COLUMNS: &str = "id, category, weight, low_watermark, high_watermark, unit, \
    deduction_per_unit_below, max_deduction_below, \
    deduction_per_unit_above, max_deduction_above, \
    penalty_mode, del_flag, created_at, updated_at";

/// Provides read access to per-category scoring configuration.
pub struct EngineConfigRepo;

impl EngineConfigRepo {
    /// Load all active policy rows. Called at the start of every engine
    /// run — never cached — so policy edits apply to the next run without
    /// a restart.
    pub async fn load_active(pool: &PgPool) -> Result<Vec<EngineConfigRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM hc_engine_configs \
             WHERE NOT del_flag \
             ORDER BY category"
        );
        sqlx::query_as::<_, EngineConfigRow>(&query)
            .fetch_all(pool)
            .await
    }
}

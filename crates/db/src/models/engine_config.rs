//! Per-category scoring configuration rows.

use serde::Serialize;
use sqlx::FromRow;
use steward_core::error::CoreError;
use steward_core::scoring::{CategoryPolicy, PenaltyMode};
use steward_core::types::{DbId, Timestamp};

/// A row from the `hc_engine_configs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EngineConfigRow {
    pub id: DbId,
    pub category: String,
    pub weight: i16,
    pub low_watermark: f64,
    pub high_watermark: f64,
    pub unit: f64,
    pub deduction_per_unit_below: f64,
    pub max_deduction_below: f64,
    pub deduction_per_unit_above: f64,
    pub max_deduction_above: f64,
    pub penalty_mode: String,
    pub del_flag: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EngineConfigRow {
    /// Convert into a validated scoring policy. A malformed row is a fatal
    /// configuration error for the run that loaded it.
    pub fn into_policy(self) -> Result<CategoryPolicy, CoreError> {
        let policy = CategoryPolicy {
            category: self.category,
            weight: self.weight,
            low_watermark: self.low_watermark,
            high_watermark: self.high_watermark,
            unit: self.unit,
            deduction_per_unit_below: self.deduction_per_unit_below,
            max_deduction_below: self.max_deduction_below,
            deduction_per_unit_above: self.deduction_per_unit_above,
            max_deduction_above: self.max_deduction_above,
            mode: PenaltyMode::parse(&self.penalty_mode)?,
        };
        policy.validate()?;
        Ok(policy)
    }
}

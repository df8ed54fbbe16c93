//! Watermark scoring policy and weighted aggregation.
//!
//! Pure logic — no database access. The engine fetches raw metric values
//! and policy rows and passes them in; identical inputs always produce
//! identical output so reports can be re-scored without re-fetching.

use crate::error::CoreError;

/// Maximum (and starting) score for every category.
pub const MAX_SCORE: i16 = 100;

/// Which side(s) of the watermark band draw a deduction.
///
/// Cache hit ratio is penalized for falling *below* its low watermark;
/// disk usage is penalized for rising *above* its high watermark. The mode
/// is configuration, not something keyed off the category name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyMode {
    Below,
    Above,
    Both,
}

impl PenaltyMode {
    /// Parse the `penalty_mode` column value.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "below" => Ok(Self::Below),
            "above" => Ok(Self::Above),
            "both" => Ok(Self::Both),
            other => Err(CoreError::Validation(format!(
                "unknown penalty mode '{other}' (expected below, above, or both)"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Below => "below",
            Self::Above => "above",
            Self::Both => "both",
        }
    }
}

/// Scoring parameters for one category, loaded fresh at the start of every
/// engine run so policy changes take effect without a restart.
#[derive(Debug, Clone)]
pub struct CategoryPolicy {
    pub category: String,
    /// Relative weight in the composite score.
    pub weight: i16,
    pub low_watermark: f64,
    pub high_watermark: f64,
    /// Distance from the watermark that counts as one deduction step.
    pub unit: f64,
    pub deduction_per_unit_below: f64,
    pub max_deduction_below: f64,
    pub deduction_per_unit_above: f64,
    pub max_deduction_above: f64,
    pub mode: PenaltyMode,
}

impl CategoryPolicy {
    /// Reject policies the scorer cannot evaluate. A bad policy row is a
    /// fatal configuration error for the whole run.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.unit <= 0.0 {
            return Err(CoreError::Validation(format!(
                "policy for '{}': unit must be positive, got {}",
                self.category, self.unit
            )));
        }
        if self.low_watermark > self.high_watermark {
            return Err(CoreError::Validation(format!(
                "policy for '{}': low_watermark ({}) must not exceed high_watermark ({})",
                self.category, self.low_watermark, self.high_watermark
            )));
        }
        if self.weight < 0 {
            return Err(CoreError::Validation(format!(
                "policy for '{}': weight must not be negative, got {}",
                self.category, self.weight
            )));
        }
        Ok(())
    }
}

/// Score a raw metric value against a category policy.
///
/// A value inside `[low_watermark, high_watermark]` (on the penalized
/// side(s)) scores [`MAX_SCORE`]. Outside, the deduction is
/// `per_unit * floor(distance / unit)`, capped at the configured maximum,
/// and the final score is floored at 0. Returns the score plus an evidence
/// string describing how it was computed.
pub fn score(value: f64, policy: &CategoryPolicy) -> (i16, String) {
    let mut deduction = 0.0;
    let mut evidence = Vec::new();

    if matches!(policy.mode, PenaltyMode::Below | PenaltyMode::Both)
        && value < policy.low_watermark
    {
        let distance = policy.low_watermark - value;
        let units = (distance / policy.unit).floor();
        let d = (policy.deduction_per_unit_below * units).min(policy.max_deduction_below);
        deduction += d;
        evidence.push(format!(
            "value {value:.2} below low watermark {:.2} by {distance:.2} ({units:.0} units, -{d:.0})",
            policy.low_watermark
        ));
    }

    if matches!(policy.mode, PenaltyMode::Above | PenaltyMode::Both)
        && value > policy.high_watermark
    {
        let distance = value - policy.high_watermark;
        let units = (distance / policy.unit).floor();
        let d = (policy.deduction_per_unit_above * units).min(policy.max_deduction_above);
        deduction += d;
        evidence.push(format!(
            "value {value:.2} above high watermark {:.2} by {distance:.2} ({units:.0} units, -{d:.0})",
            policy.high_watermark
        ));
    }

    let score = (f64::from(MAX_SCORE) - deduction).clamp(0.0, f64::from(MAX_SCORE)) as i16;

    let evidence = if evidence.is_empty() {
        format!(
            "value {value:.2} within [{:.2}, {:.2}]",
            policy.low_watermark, policy.high_watermark
        )
    } else {
        evidence.join("; ")
    };

    (score, evidence)
}

/// Weighted average of category scores, rounded to the nearest integer.
///
/// Only categories that carry a configured weight appear here — a category
/// with no policy row is excluded from both numerator and denominator
/// rather than treated as zero. A category whose fetch failed *is*
/// included, at score 0, under its configured weight. Returns 0 if no
/// weights are configured at all.
pub fn weighted_average(weighted_scores: &[(i16, i16)]) -> i16 {
    let total_weight: i64 = weighted_scores.iter().map(|(_, w)| i64::from(*w)).sum();
    if total_weight == 0 {
        return 0;
    }
    let sum: i64 = weighted_scores
        .iter()
        .map(|(s, w)| i64::from(*s) * i64::from(*w))
        .sum();
    (sum as f64 / total_weight as f64).round() as i16
}

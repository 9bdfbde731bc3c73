use serde::Serialize;

use crate::detection::cadence::Frequency;

/// Deterministic detection-policy identifier, emitted alongside results so
/// threshold changes stay auditable across runs and support sessions.
pub const DETECTION_POLICY_VERSION: &str = "detection/v1";

/// v1 recurring-detection policy.
///
/// Every threshold the pipeline consults lives here; stages never carry
/// literals of their own, so the production path, the re-sync path, and the
/// trace tooling cannot drift apart.
///
/// Notes:
/// - Thresholds are conservative (precision-first).
/// - Tolerances scale with the anchor period and carry an absolute floor so
///   short cadences keep a usable band.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DetectionPolicy {
    pub lookback_months: u32,
    pub min_group_size: usize,
    pub gap_tolerance_days: i64,
    pub min_cluster_size: usize,
    pub fallback_cluster_size: usize,
    pub fallback_min_segment_size: usize,
    pub fallback_min_distinct_amounts: usize,
    pub anchor_tolerance_ratio: f64,
    pub anchor_tolerance_floor_days: f64,
    pub validation_tolerance_ratio: f64,
    pub validation_tolerance_floor_days: f64,
    pub min_date_consistency: f64,
    pub max_mad_ratio: f64,
    pub consistency_weight: f64,
    pub dispersion_weight: f64,
    pub sample_weight: f64,
    pub amount_weight: f64,
    pub sample_saturation: usize,
    pub min_confidence: f64,
    pub recency_multiplier: f64,
    pub biweekly_recency_floor_days: f64,
}

impl DetectionPolicy {
    /// Band half-width for matching a median interval to `frequency`'s anchor.
    pub fn anchor_tolerance_days(self, frequency: Frequency) -> f64 {
        (frequency.canonical_interval_days() * self.anchor_tolerance_ratio)
            .max(self.anchor_tolerance_floor_days)
    }

    /// Band half-width for counting a single gap as consistent with
    /// `frequency` during validation. Proportional so yearly gaps get a far
    /// wider absolute band than weekly ones; floored so weekly keeps at
    /// least a couple of days of jitter room.
    pub fn validation_tolerance_days(self, frequency: Frequency) -> f64 {
        (frequency.canonical_interval_days() * self.validation_tolerance_ratio)
            .max(self.validation_tolerance_floor_days)
    }

    /// Largest interval MAD a valid pattern of this frequency may show.
    pub fn max_mad_days(self, frequency: Frequency) -> f64 {
        frequency.canonical_interval_days() * self.max_mad_ratio
    }

    /// Saturating sample-size factor: linear up to `sample_saturation`
    /// occurrences, flat at 1.0 beyond.
    pub fn sample_factor(self, occurrences: usize) -> f64 {
        (occurrences.min(self.sample_saturation) as f64) / (self.sample_saturation as f64)
    }

    /// The confidence formula. This is the only place the weighting exists;
    /// `confidence = w_c * date_consistency + w_d * (1 - mad/mad_cap)
    ///             + w_s * min(n, saturation)/saturation + w_a * amount_consistency`
    /// with all four inputs already in [0, 1].
    pub fn confidence(
        self,
        date_consistency: f64,
        dispersion_score: f64,
        sample_factor: f64,
        amount_consistency: f64,
    ) -> f64 {
        (self.consistency_weight * date_consistency)
            + (self.dispersion_weight * dispersion_score)
            + (self.sample_weight * sample_factor)
            + (self.amount_weight * amount_consistency)
    }

    /// Staleness cutoff in days. Biweekly gets an absolute floor: 1.5x a
    /// 14-day interval is 21 days, which real payroll jitter overruns.
    pub fn recency_threshold_days(self, frequency: Frequency, median_interval_days: f64) -> f64 {
        let base = median_interval_days * self.recency_multiplier;
        if frequency == Frequency::Biweekly {
            return base.max(self.biweekly_recency_floor_days);
        }
        base
    }
}

pub const DETECTION_POLICY_V1: DetectionPolicy = DetectionPolicy {
    lookback_months: 12,
    min_group_size: 3,
    gap_tolerance_days: 100,
    min_cluster_size: 3,
    fallback_cluster_size: 2,
    fallback_min_segment_size: 4,
    fallback_min_distinct_amounts: 2,
    anchor_tolerance_ratio: 0.15,
    anchor_tolerance_floor_days: 2.0,
    validation_tolerance_ratio: 0.20,
    validation_tolerance_floor_days: 2.0,
    min_date_consistency: 0.6,
    max_mad_ratio: 0.15,
    consistency_weight: 0.4,
    dispersion_weight: 0.3,
    sample_weight: 0.2,
    amount_weight: 0.1,
    sample_saturation: 6,
    min_confidence: 0.5,
    recency_multiplier: 1.5,
    biweekly_recency_floor_days: 30.0,
};

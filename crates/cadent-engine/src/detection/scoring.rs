use crate::detection::cadence::CadenceResult;
use crate::detection::policy::DetectionPolicy;
use crate::detection::validation::ValidationResult;

/// Every member of an amount cluster carries the same rounded amount, so
/// this term is 1.0 by construction. It stays in the formula so a future
/// tolerance-based clusterer can feed a real value without touching the
/// weights.
const AMOUNT_CONSISTENCY: f64 = 1.0;

/// Confidence inputs and the combined score for one cluster. The weighting
/// itself lives on [`DetectionPolicy::confidence`]; this is the only place
/// the four inputs are assembled, so every caller sees the same arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub date_consistency: f64,
    pub dispersion_score: f64,
    pub sample_factor: f64,
    pub amount_consistency: f64,
    pub confidence: f64,
}

pub fn score_cluster(
    occurrences: usize,
    cadence: CadenceResult,
    validation: ValidationResult,
    policy: DetectionPolicy,
) -> ScoreBreakdown {
    let mad_cap = policy.max_mad_days(cadence.frequency);
    let dispersion_score = if mad_cap > 0.0 {
        (1.0 - cadence.mad / mad_cap).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let sample_factor = policy.sample_factor(occurrences);

    let confidence = policy.confidence(
        validation.date_consistency,
        dispersion_score,
        sample_factor,
        AMOUNT_CONSISTENCY,
    );

    ScoreBreakdown {
        date_consistency: validation.date_consistency,
        dispersion_score,
        sample_factor,
        amount_consistency: AMOUNT_CONSISTENCY,
        confidence,
    }
}

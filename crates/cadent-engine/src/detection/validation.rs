use chrono::NaiveDate;

use crate::detection::cadence::{CadenceResult, interval_days};
use crate::detection::policy::DetectionPolicy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub date_consistency: f64,
}

/// Checks that the observed dates actually follow the classified cadence
/// rather than merely averaging out to it. `date_consistency` is the
/// fraction of gaps inside the frequency's validation band (proportional to
/// the canonical period, so yearly tolerates weeks of drift where weekly
/// tolerates days). A pattern is valid when that fraction clears the
/// consistency bar and the interval MAD stays small relative to the period;
/// a large MAD means the apparent periodicity is coincidental even if the
/// median landed on an anchor.
pub fn validate_pattern(
    dates: &[NaiveDate],
    cadence: CadenceResult,
    policy: DetectionPolicy,
) -> ValidationResult {
    let gaps = interval_days(dates);
    if gaps.is_empty() {
        return ValidationResult {
            valid: false,
            date_consistency: 0.0,
        };
    }

    let expected = cadence.frequency.canonical_interval_days();
    let tolerance = policy.validation_tolerance_days(cadence.frequency);
    let in_band = gaps
        .iter()
        .filter(|gap| ((**gap as f64) - expected).abs() <= tolerance)
        .count();
    let date_consistency = (in_band as f64) / (gaps.len() as f64);

    let valid = date_consistency >= policy.min_date_consistency
        && cadence.mad <= policy.max_mad_days(cadence.frequency);

    ValidationResult {
        valid,
        date_consistency,
    }
}

use chrono::{Duration, NaiveDate};

use crate::detection::cadence::CadenceResult;
use crate::detection::policy::DetectionPolicy;

/// Outcome of the staleness check for one cluster. `next_expected_at` is
/// filled regardless of the verdict so the trace can show when a rejected
/// pattern would have recurred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyDecision {
    pub active: bool,
    pub days_since_last: i64,
    pub threshold_days: f64,
    pub next_expected_at: NaiveDate,
}

/// Rejects a cluster whose latest occurrence is too old relative to its own
/// interval. The threshold is 1.5x the median interval, except biweekly,
/// which is floored (payroll posting jitter regularly overruns 21 days).
pub fn gate_recency(
    last_occurrence_at: NaiveDate,
    cadence: CadenceResult,
    now: NaiveDate,
    policy: DetectionPolicy,
) -> RecencyDecision {
    let days_since_last = (now - last_occurrence_at).num_days();
    let threshold_days = policy.recency_threshold_days(cadence.frequency, cadence.median_interval_days);
    let next_expected_at =
        last_occurrence_at + Duration::days(cadence.median_interval_days.round() as i64);

    RecencyDecision {
        active: (days_since_last as f64) <= threshold_days,
        days_since_last,
        threshold_days,
        next_expected_at,
    }
}

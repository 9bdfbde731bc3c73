use chrono::NaiveDate;
use serde::Serialize;

use crate::detection::policy::DetectionPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Self; 5] = [
        Self::Weekly,
        Self::Biweekly,
        Self::Monthly,
        Self::Quarterly,
        Self::Yearly,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    pub const fn canonical_interval_days(self) -> f64 {
        match self {
            Self::Weekly => 7.0,
            Self::Biweekly => 14.0,
            Self::Monthly => 30.0,
            Self::Quarterly => 91.0,
            Self::Yearly => 365.0,
        }
    }
}

/// Interval statistics for one amount cluster. The median and MAD are taken
/// over whole-day gaps, so both are either integral or `x.5` exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CadenceResult {
    pub frequency: Frequency,
    pub median_interval_days: f64,
    pub mad: f64,
}

/// Infers a cadence from ascending occurrence dates. Returns `None` when the
/// median gap sits outside every anchor's tolerance band; an unmatched median
/// is an ordinary rejection, not an error, because a pattern with no
/// canonical frequency is not an actionable obligation.
pub fn infer_cadence(dates: &[NaiveDate], policy: DetectionPolicy) -> Option<CadenceResult> {
    let gaps = interval_days(dates);
    if gaps.is_empty() {
        return None;
    }

    let median_interval_days = median_of_gaps(&gaps)?;
    let deviations = gaps
        .iter()
        .map(|gap| ((*gap as f64) - median_interval_days).abs())
        .collect::<Vec<f64>>();
    let mad = median_f64_sorted(&sorted(deviations)).unwrap_or(0.0);

    let frequency = classify_interval(median_interval_days, policy)?;
    Some(CadenceResult {
        frequency,
        median_interval_days,
        mad,
    })
}

/// Whole-day gaps between consecutive dates, in input order.
pub fn interval_days(dates: &[NaiveDate]) -> Vec<i64> {
    let mut gaps = Vec::new();
    for index in 1..dates.len() {
        gaps.push((dates[index] - dates[index - 1]).num_days());
    }
    gaps
}

fn classify_interval(median_interval_days: f64, policy: DetectionPolicy) -> Option<Frequency> {
    let mut best: Option<(Frequency, f64)> = None;
    for frequency in Frequency::ALL {
        let error = (median_interval_days - frequency.canonical_interval_days()).abs();
        if error > policy.anchor_tolerance_days(frequency) {
            continue;
        }
        let closer = match best {
            Some((_, best_error)) => error < best_error,
            None => true,
        };
        if closer {
            best = Some((frequency, error));
        }
    }
    best.map(|(frequency, _)| frequency)
}

fn median_of_gaps(gaps: &[i64]) -> Option<f64> {
    let values = gaps.iter().map(|gap| *gap as f64).collect::<Vec<f64>>();
    median_f64_sorted(&sorted(values))
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|left, right| left.total_cmp(right));
    values
}

pub(crate) fn median_f64_sorted(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mid = values.len() / 2;
    if values.len().is_multiple_of(2) {
        return Some((values[mid - 1] + values[mid]) / 2.0);
    }
    Some(values[mid])
}

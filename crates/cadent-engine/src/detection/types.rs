use chrono::NaiveDate;
use serde::Serialize;

use crate::detection::cadence::Frequency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// One calendar-day transaction as handed over by the merchant-grouping
/// subsystem. `merchant_group_id` is `None` when fuzzy matching could not
/// assign the raw descriptor to a group; such rows never form candidates.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub txn_id: String,
    pub posted_at: NaiveDate,
    pub amount: f64,
    pub direction: Direction,
    pub merchant_group_id: Option<String>,
    pub account_key: String,
}

impl Transaction {
    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }
}

/// An accepted recurring pattern. Suitable for upserting keyed by
/// (merchant_group_id, account_key, direction, representative_amount).
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    pub merchant_group_id: String,
    pub account_key: String,
    pub direction: Direction,
    pub frequency: Frequency,
    pub median_interval_days: f64,
    pub confidence: f64,
    pub occurrence_count: i64,
    pub representative_amount: f64,
    pub last_occurrence_at: NaiveDate,
    pub next_expected_at: NaiveDate,
}

use serde::Serialize;
use serde_json::Value;

use crate::API_VERSION;
use crate::detection::date::format_iso_date;
use crate::detection::policy::DetectionPolicy;
use crate::detection::trace::RunTrace;
use crate::detection::types::DetectionOutcome;
use crate::error::{EngineError, EngineResult};
use crate::feed::FeedIssue;

#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub ok: bool,
    pub command: String,
    pub version: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEnvelope {
    pub ok: bool,
    pub error: ErrorContract,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorContract {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
}

/// One accepted pattern, dates as ISO strings, ready for JSON output or a
/// collaborator's upsert keyed by (merchant_group_id, account_key,
/// direction, representative_amount).
#[derive(Debug, Clone, Serialize)]
pub struct DetectionRow {
    pub merchant_group_id: String,
    pub account_key: String,
    pub direction: String,
    pub frequency: String,
    pub median_interval_days: f64,
    pub confidence: f64,
    pub occurrence_count: i64,
    pub representative_amount: f64,
    pub last_occurrence_at: String,
    pub next_expected_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedSummary {
    pub rows_read: i64,
    pub rows_valid: i64,
    pub rows_excluded: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionData {
    pub policy_version: String,
    pub as_of: String,
    pub feed: FeedSummary,
    pub feed_issues: Vec<FeedIssue>,
    pub rows: Vec<DetectionRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceData {
    pub policy_version: String,
    pub as_of: String,
    pub feed: FeedSummary,
    pub feed_issues: Vec<FeedIssue>,
    pub rows: Vec<DetectionRow>,
    pub trace: RunTrace,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyData {
    pub policy_version: String,
    pub policy: DetectionPolicy,
}

pub fn detection_rows(outcomes: &[DetectionOutcome]) -> Vec<DetectionRow> {
    outcomes
        .iter()
        .map(|outcome| DetectionRow {
            merchant_group_id: outcome.merchant_group_id.clone(),
            account_key: outcome.account_key.clone(),
            direction: outcome.direction.as_str().to_string(),
            frequency: outcome.frequency.as_str().to_string(),
            median_interval_days: outcome.median_interval_days,
            confidence: round_to(outcome.confidence, 4),
            occurrence_count: outcome.occurrence_count,
            representative_amount: outcome.representative_amount,
            last_occurrence_at: format_iso_date(&outcome.last_occurrence_at),
            next_expected_at: format_iso_date(&outcome.next_expected_at),
        })
        .collect()
}

pub fn success<T>(command: &str, data: T) -> EngineResult<SuccessEnvelope>
where
    T: Serialize,
{
    let json_data = serde_json::to_value(data)
        .map_err(|err| EngineError::internal_serialization(&err.to_string()))?;
    Ok(SuccessEnvelope {
        ok: true,
        command: command.to_string(),
        version: API_VERSION.to_string(),
        data: json_data,
    })
}

pub fn failure_from_error(error: &EngineError) -> FailureEnvelope {
    FailureEnvelope {
        ok: false,
        error: ErrorContract {
            code: error.code.clone(),
            message: error.message.clone(),
            recovery_steps: error.recovery_steps.clone(),
        },
        data: error.data.clone(),
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let exponent = i32::try_from(decimals).unwrap_or(4);
    let factor = 10_f64.powi(exponent);
    (value * factor).round() / factor
}

use serde::Serialize;

use crate::detection::cadence::Frequency;
use crate::detection::types::Direction;

/// Stage-by-stage record of one detection run. The trace is produced by the
/// same pass that produces the outcomes; diagnostic tooling reads it instead
/// of re-running any threshold math of its own.
#[derive(Debug, Clone, Serialize)]
pub struct RunTrace {
    pub groups: Vec<GroupTrace>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupTrace {
    pub merchant_group_id: String,
    pub direction: Direction,
    pub account_key: String,
    pub transaction_count: usize,
    pub segment_count: usize,
    pub active_segment_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<GroupSkip>,
    pub clusters: Vec<ClusterTrace>,
}

/// Group-level short circuits that happen before any cluster exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSkip {
    BelowMinimumSize,
    NoQualifyingCluster,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterTrace {
    pub amount: f64,
    pub occurrence_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<CadenceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_consistency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since_last: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recency_threshold_days: Option<f64>,
    pub resolution: ClusterResolution,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CadenceSummary {
    pub frequency: Frequency,
    pub median_interval_days: f64,
    pub mad: f64,
}

/// Terminal state of one cluster. Rejection is a filtering decision; the
/// reason string is for humans reading the trace, the stage for tooling.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClusterResolution {
    Accepted,
    Rejected { stage: RejectStage, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectStage {
    Cadence,
    Validation,
    Score,
    Recency,
}

impl RejectStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cadence => "cadence",
            Self::Validation => "validation",
            Self::Score => "score",
            Self::Recency => "recency",
        }
    }
}

impl ClusterResolution {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

use std::cmp::Ordering;

use chrono::NaiveDate;
use tracing::debug;

use crate::detection::cadence::infer_cadence;
use crate::detection::clustering::{AmountCluster, cluster_by_amount};
use crate::detection::grouping::{CandidateGroup, group_candidates};
use crate::detection::policy::{DETECTION_POLICY_V1, DetectionPolicy};
use crate::detection::recency::gate_recency;
use crate::detection::scoring::score_cluster;
use crate::detection::segmentation::segment_by_gaps;
use crate::detection::trace::{
    CadenceSummary, ClusterResolution, ClusterTrace, GroupSkip, GroupTrace, RejectStage, RunTrace,
};
use crate::detection::types::{DetectionOutcome, Transaction};
use crate::detection::validation::validate_pattern;

/// Runs the detection pipeline under the v1 policy. Pure: the only time
/// reference is the injected `now`, captured once by the caller.
pub fn detect(transactions: &[Transaction], now: NaiveDate) -> Vec<DetectionOutcome> {
    detect_with_policy(transactions, now, DETECTION_POLICY_V1)
}

pub fn detect_with_policy(
    transactions: &[Transaction],
    now: NaiveDate,
    policy: DetectionPolicy,
) -> Vec<DetectionOutcome> {
    run_detection(transactions, now, policy).0
}

/// Identical computation to [`detect_with_policy`], returning the per-group,
/// per-cluster stage records alongside the outcomes. The trace is a byproduct
/// of the single pipeline pass; it never re-derives a threshold.
pub fn detect_with_trace(
    transactions: &[Transaction],
    now: NaiveDate,
    policy: DetectionPolicy,
) -> (Vec<DetectionOutcome>, RunTrace) {
    run_detection(transactions, now, policy)
}

fn run_detection(
    transactions: &[Transaction],
    now: NaiveDate,
    policy: DetectionPolicy,
) -> (Vec<DetectionOutcome>, RunTrace) {
    let groups = group_candidates(transactions, now, policy);
    let mut outcomes: Vec<DetectionOutcome> = Vec::new();
    let mut group_traces: Vec<GroupTrace> = Vec::new();

    for group in &groups {
        let (group_trace, group_outcomes) = evaluate_group(group, now, policy);
        outcomes.extend(group_outcomes);
        group_traces.push(group_trace);
    }

    outcomes.sort_by(compare_outcomes);
    let trace = RunTrace {
        groups: group_traces,
    };
    (outcomes, trace)
}

fn evaluate_group(
    group: &CandidateGroup,
    now: NaiveDate,
    policy: DetectionPolicy,
) -> (GroupTrace, Vec<DetectionOutcome>) {
    let mut trace = GroupTrace {
        merchant_group_id: group.merchant_group_id.clone(),
        direction: group.direction,
        account_key: group.account_key.clone(),
        transaction_count: group.transactions.len(),
        segment_count: 0,
        active_segment_size: 0,
        skip: None,
        clusters: Vec::new(),
    };

    if group.transactions.len() < policy.min_group_size {
        debug!(
            merchant_group_id = %group.merchant_group_id,
            account_key = %group.account_key,
            transaction_count = group.transactions.len(),
            "group below minimum sample size, skipped"
        );
        trace.skip = Some(GroupSkip::BelowMinimumSize);
        return (trace, Vec::new());
    }

    let segments = segment_by_gaps(&group.transactions, policy);
    trace.segment_count = segments.len();
    let Some(active_segment) = segments.last() else {
        trace.skip = Some(GroupSkip::BelowMinimumSize);
        return (trace, Vec::new());
    };
    trace.active_segment_size = active_segment.transactions.len();

    let clusters = cluster_by_amount(active_segment, policy);
    if clusters.is_empty() {
        debug!(
            merchant_group_id = %group.merchant_group_id,
            account_key = %group.account_key,
            active_segment_size = active_segment.transactions.len(),
            "no amount cluster qualified in the active segment"
        );
        trace.skip = Some(GroupSkip::NoQualifyingCluster);
        return (trace, Vec::new());
    }

    let mut outcomes = Vec::new();
    for cluster in &clusters {
        let (cluster_trace, outcome) = evaluate_cluster(group, cluster, now, policy);
        if let ClusterResolution::Rejected { stage, reason } = &cluster_trace.resolution {
            debug!(
                merchant_group_id = %group.merchant_group_id,
                account_key = %group.account_key,
                amount = cluster.amount,
                stage = stage.as_str(),
                reason = %reason,
                "cluster rejected"
            );
        }
        trace.clusters.push(cluster_trace);
        outcomes.extend(outcome);
    }

    (trace, outcomes)
}

fn evaluate_cluster(
    group: &CandidateGroup,
    cluster: &AmountCluster,
    now: NaiveDate,
    policy: DetectionPolicy,
) -> (ClusterTrace, Option<DetectionOutcome>) {
    let mut trace = ClusterTrace {
        amount: cluster.amount,
        occurrence_count: cluster.transactions.len(),
        cadence: None,
        date_consistency: None,
        confidence: None,
        days_since_last: None,
        recency_threshold_days: None,
        resolution: ClusterResolution::Accepted,
    };

    let dates = cluster
        .transactions
        .iter()
        .map(|transaction| transaction.posted_at)
        .collect::<Vec<NaiveDate>>();

    let Some(cadence) = infer_cadence(&dates, policy) else {
        trace.resolution = ClusterResolution::Rejected {
            stage: RejectStage::Cadence,
            reason: "median interval matches no canonical frequency".to_string(),
        };
        return (trace, None);
    };
    trace.cadence = Some(CadenceSummary {
        frequency: cadence.frequency,
        median_interval_days: cadence.median_interval_days,
        mad: cadence.mad,
    });

    let validation = validate_pattern(&dates, cadence, policy);
    trace.date_consistency = Some(validation.date_consistency);
    if !validation.valid {
        trace.resolution = ClusterResolution::Rejected {
            stage: RejectStage::Validation,
            reason: format!(
                "date consistency {:.2} or interval dispersion {:.1}d outside the {} band",
                validation.date_consistency,
                cadence.mad,
                cadence.frequency.as_str()
            ),
        };
        return (trace, None);
    }

    let breakdown = score_cluster(cluster.transactions.len(), cadence, validation, policy);
    trace.confidence = Some(breakdown.confidence);
    if breakdown.confidence < policy.min_confidence {
        trace.resolution = ClusterResolution::Rejected {
            stage: RejectStage::Score,
            reason: format!(
                "confidence {:.2} below acceptance threshold {:.2}",
                breakdown.confidence, policy.min_confidence
            ),
        };
        return (trace, None);
    }

    let Some(last_occurrence_at) = dates.last().copied() else {
        trace.resolution = ClusterResolution::Rejected {
            stage: RejectStage::Recency,
            reason: "cluster has no occurrences".to_string(),
        };
        return (trace, None);
    };
    let recency = gate_recency(last_occurrence_at, cadence, now, policy);
    trace.days_since_last = Some(recency.days_since_last);
    trace.recency_threshold_days = Some(recency.threshold_days);
    if !recency.active {
        trace.resolution = ClusterResolution::Rejected {
            stage: RejectStage::Recency,
            reason: format!(
                "{} days since last occurrence exceeds {:.1}",
                recency.days_since_last, recency.threshold_days
            ),
        };
        return (trace, None);
    }

    let outcome = DetectionOutcome {
        merchant_group_id: group.merchant_group_id.clone(),
        account_key: group.account_key.clone(),
        direction: group.direction,
        frequency: cadence.frequency,
        median_interval_days: cadence.median_interval_days,
        confidence: breakdown.confidence,
        occurrence_count: i64::try_from(cluster.transactions.len()).unwrap_or(0),
        representative_amount: cluster.amount,
        last_occurrence_at,
        next_expected_at: recency.next_expected_at,
    };
    (trace, Some(outcome))
}

fn compare_outcomes(left: &DetectionOutcome, right: &DetectionOutcome) -> Ordering {
    left.next_expected_at
        .cmp(&right.next_expected_at)
        .then_with(|| right.confidence.total_cmp(&left.confidence))
        .then_with(|| left.merchant_group_id.cmp(&right.merchant_group_id))
        .then_with(|| left.account_key.cmp(&right.account_key))
        .then_with(|| left.direction.cmp(&right.direction))
        .then_with(|| left.representative_amount.total_cmp(&right.representative_amount))
}

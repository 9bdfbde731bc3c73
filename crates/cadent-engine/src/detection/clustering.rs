use std::collections::BTreeMap;

use crate::detection::policy::DetectionPolicy;
use crate::detection::segmentation::Segment;
use crate::detection::types::Transaction;

/// Transactions of one segment sharing the same absolute amount after
/// 2-decimal currency rounding.
#[derive(Debug, Clone)]
pub struct AmountCluster {
    pub amount: f64,
    pub transactions: Vec<Transaction>,
}

/// Buckets a segment by rounded absolute amount. Bucketing runs on integer
/// cents so "exact equality on the rounded value" is actually exact.
///
/// Primary rule: keep buckets with at least `min_cluster_size` rows. If that
/// yields nothing, a fallback keeps `fallback_cluster_size`-row buckets, but
/// only for segments with enough rows spread over enough distinct amounts.
/// The fallback catches merchants billing two or more legitimate recurring
/// amounts (two subscription tiers in one household), which could otherwise
/// never reach the primary threshold per amount. Qualifying buckets are
/// independent: each one continues through the pipeline on its own.
pub fn cluster_by_amount(segment: &Segment, policy: DetectionPolicy) -> Vec<AmountCluster> {
    let mut buckets: BTreeMap<i64, Vec<Transaction>> = BTreeMap::new();
    for transaction in &segment.transactions {
        buckets
            .entry(amount_cents(transaction.amount))
            .or_default()
            .push(transaction.clone());
    }

    let distinct_amounts = buckets.len();
    let primary = collect_buckets(&buckets, policy.min_cluster_size);
    if !primary.is_empty() {
        return primary;
    }

    let fallback_applies = segment.transactions.len() >= policy.fallback_min_segment_size
        && distinct_amounts >= policy.fallback_min_distinct_amounts;
    if fallback_applies {
        return collect_buckets(&buckets, policy.fallback_cluster_size);
    }

    Vec::new()
}

fn collect_buckets(
    buckets: &BTreeMap<i64, Vec<Transaction>>,
    minimum_size: usize,
) -> Vec<AmountCluster> {
    buckets
        .iter()
        .filter(|(_, transactions)| transactions.len() >= minimum_size)
        .map(|(cents, transactions)| AmountCluster {
            amount: (*cents as f64) / 100.0,
            transactions: transactions.clone(),
        })
        .collect()
}

fn amount_cents(amount: f64) -> i64 {
    (amount.abs() * 100.0).round() as i64
}

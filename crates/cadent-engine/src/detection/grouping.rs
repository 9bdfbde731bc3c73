use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::detection::date::lookback_start;
use crate::detection::policy::DetectionPolicy;
use crate::detection::types::{Direction, Transaction};

/// All of one merchant's activity in one direction on one funding account,
/// restricted to the lookback window. Built fresh per run, never mutated.
#[derive(Debug, Clone)]
pub struct CandidateGroup {
    pub merchant_group_id: String,
    pub direction: Direction,
    pub account_key: String,
    pub transactions: Vec<Transaction>,
}

/// Partitions transactions into candidate groups keyed by
/// (merchant_group_id, direction, account_key). Rows without a merchant
/// group and rows outside `[now - lookback, now]` are skipped. Groups come
/// back in key order with date-ascending rows, so a run over identical
/// input is byte-for-byte reproducible.
///
/// Minimum-size filtering happens in the pipeline, where undersized groups
/// can still be surfaced to the trace.
pub fn group_candidates(
    transactions: &[Transaction],
    now: NaiveDate,
    policy: DetectionPolicy,
) -> Vec<CandidateGroup> {
    let window_start = lookback_start(now, policy.lookback_months);
    let mut groups: BTreeMap<String, CandidateGroup> = BTreeMap::new();

    for transaction in transactions {
        if transaction.posted_at < window_start || transaction.posted_at > now {
            continue;
        }
        let Some(merchant_group_id) = transaction.merchant_group_id.as_deref() else {
            continue;
        };

        let key = format!(
            "{}|{}|{}",
            merchant_group_id,
            transaction.direction.as_str(),
            transaction.account_key
        );
        let entry = groups.entry(key).or_insert_with(|| CandidateGroup {
            merchant_group_id: merchant_group_id.to_string(),
            direction: transaction.direction,
            account_key: transaction.account_key.clone(),
            transactions: Vec::new(),
        });
        entry.transactions.push(transaction.clone());
    }

    let mut result = groups.into_values().collect::<Vec<CandidateGroup>>();
    for group in &mut result {
        group.transactions.sort_by(|left, right| {
            left.posted_at
                .cmp(&right.posted_at)
                .then_with(|| left.amount.total_cmp(&right.amount))
                .then_with(|| left.txn_id.cmp(&right.txn_id))
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::detection::policy::DETECTION_POLICY_V1;
    use crate::detection::types::{Direction, Transaction};

    use super::group_candidates;

    fn txn(txn_id: &str, date: &str, amount: f64, direction: Direction) -> Transaction {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d");
        assert!(parsed.is_ok());
        Transaction {
            txn_id: txn_id.to_string(),
            posted_at: parsed.unwrap_or(NaiveDate::MIN),
            amount,
            direction,
            merchant_group_id: Some("mg_gym".to_string()),
            account_key: "acct_checking".to_string(),
        }
    }

    fn now(date: &str) -> NaiveDate {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d");
        assert!(parsed.is_ok());
        parsed.unwrap_or(NaiveDate::MIN)
    }

    #[test]
    fn splits_directions_into_separate_groups() {
        let rows = vec![
            txn("t1", "2026-01-10", -25.0, Direction::Expense),
            txn("t2", "2026-02-10", -25.0, Direction::Expense),
            txn("t3", "2026-01-12", 25.0, Direction::Income),
        ];
        let groups = group_candidates(&rows, now("2026-03-01"), DETECTION_POLICY_V1);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn skips_rows_without_merchant_group() {
        let mut orphan = txn("t1", "2026-01-10", -25.0, Direction::Expense);
        orphan.merchant_group_id = None;
        let groups = group_candidates(&[orphan], now("2026-03-01"), DETECTION_POLICY_V1);
        assert!(groups.is_empty());
    }

    #[test]
    fn window_is_inclusive_of_both_endpoints() {
        let rows = vec![
            txn("t1", "2025-03-01", -25.0, Direction::Expense),
            txn("t2", "2025-02-28", -25.0, Direction::Expense),
            txn("t3", "2026-03-01", -25.0, Direction::Expense),
            txn("t4", "2026-03-02", -25.0, Direction::Expense),
        ];
        let groups = group_candidates(&rows, now("2026-03-01"), DETECTION_POLICY_V1);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].transactions.len(), 2);
        assert_eq!(groups[0].transactions[0].txn_id, "t1");
        assert_eq!(groups[0].transactions[1].txn_id, "t3");
    }

    #[test]
    fn rows_come_back_date_sorted_regardless_of_input_order() {
        let rows = vec![
            txn("t3", "2026-03-10", -25.0, Direction::Expense),
            txn("t1", "2026-01-10", -25.0, Direction::Expense),
            txn("t2", "2026-02-10", -25.0, Direction::Expense),
        ];
        let groups = group_candidates(&rows, now("2026-03-15"), DETECTION_POLICY_V1);
        assert_eq!(groups.len(), 1);
        let ids = groups[0]
            .transactions
            .iter()
            .map(|row| row.txn_id.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }
}

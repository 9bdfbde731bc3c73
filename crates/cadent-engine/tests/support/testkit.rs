use cadent_engine::{Direction, Transaction};
use chrono::{Duration, NaiveDate};

pub fn date(value: &str) -> NaiveDate {
    let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d");
    assert!(parsed.is_ok(), "bad fixture date: {value}");
    parsed.unwrap_or(NaiveDate::MIN)
}

pub fn txn(
    txn_id: &str,
    merchant_group_id: &str,
    account_key: &str,
    posted_at: &str,
    amount: f64,
) -> Transaction {
    Transaction {
        txn_id: txn_id.to_string(),
        posted_at: date(posted_at),
        amount,
        direction: if amount < 0.0 {
            Direction::Expense
        } else {
            Direction::Income
        },
        merchant_group_id: Some(merchant_group_id.to_string()),
        account_key: account_key.to_string(),
    }
}

/// A run of same-amount transactions for one merchant: the first lands on
/// `start`, each later one after the matching entry in `gaps`.
pub fn series(
    merchant_group_id: &str,
    account_key: &str,
    start: &str,
    gaps: &[i64],
    amount: f64,
) -> Vec<Transaction> {
    let mut posted_at = date(start);
    let mut rows = vec![row_at(merchant_group_id, account_key, posted_at, amount, 0)];
    for (index, gap) in gaps.iter().enumerate() {
        posted_at += Duration::days(*gap);
        rows.push(row_at(
            merchant_group_id,
            account_key,
            posted_at,
            amount,
            index + 1,
        ));
    }
    rows
}

/// First-of-month style fixture: `count` occurrences, one calendar month
/// apart, starting at `start`.
pub fn monthly_series(
    merchant_group_id: &str,
    account_key: &str,
    start: &str,
    count: usize,
    amount: f64,
) -> Vec<Transaction> {
    let first = date(start);
    (0..count)
        .map(|index| {
            let posted_at = first
                .checked_add_months(chrono::Months::new(index as u32))
                .unwrap_or(first);
            row_at(merchant_group_id, account_key, posted_at, amount, index)
        })
        .collect()
}

pub fn last_date(rows: &[Transaction]) -> NaiveDate {
    let last = rows.iter().map(|row| row.posted_at).max();
    assert!(last.is_some(), "fixture series is empty");
    last.unwrap_or(NaiveDate::MIN)
}

fn row_at(
    merchant_group_id: &str,
    account_key: &str,
    posted_at: NaiveDate,
    amount: f64,
    index: usize,
) -> Transaction {
    Transaction {
        txn_id: format!("{merchant_group_id}-{index}"),
        posted_at,
        amount,
        direction: if amount < 0.0 {
            Direction::Expense
        } else {
            Direction::Income
        },
        merchant_group_id: Some(merchant_group_id.to_string()),
        account_key: account_key.to_string(),
    }
}

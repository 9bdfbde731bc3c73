use chrono::NaiveDate;

use crate::detection::policy::DetectionPolicy;
use crate::detection::types::Transaction;

/// A gap-free contiguous run of a candidate group's transactions.
#[derive(Debug, Clone)]
pub struct Segment {
    pub transactions: Vec<Transaction>,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
}

/// Splits date-ascending transactions into segments wherever consecutive
/// dates sit more than `gap_tolerance_days` apart. The tolerance is
/// cadence-agnostic: wide enough that quarterly gaps never split a live
/// pattern, tight enough that a cancel-then-resubscribe stretch does.
/// Segments come back oldest first; only the last one reflects a pattern
/// that could still be active.
pub fn segment_by_gaps(transactions: &[Transaction], policy: DetectionPolicy) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut current: Vec<Transaction> = Vec::new();

    for transaction in transactions {
        if let Some(previous) = current.last() {
            let gap = (transaction.posted_at - previous.posted_at).num_days();
            if gap > policy.gap_tolerance_days {
                push_segment(&mut segments, std::mem::take(&mut current));
            }
        }
        current.push(transaction.clone());
    }
    push_segment(&mut segments, current);

    segments
}

fn push_segment(segments: &mut Vec<Segment>, transactions: Vec<Transaction>) {
    let (Some(first), Some(last)) = (transactions.first(), transactions.last()) else {
        return;
    };
    let start_at = first.posted_at;
    let end_at = last.posted_at;
    segments.push(Segment {
        transactions,
        start_at,
        end_at,
    });
}

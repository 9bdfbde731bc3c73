use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::detection::date::parse_iso_date;
use crate::detection::types::{Direction, Transaction};
use crate::error::{EngineError, EngineResult};

const REQUIRED_FIELDS: [&str; 5] = ["txn_id", "posted_at", "amount", "direction", "account_key"];
const OPTIONAL_FIELDS: [&str; 1] = ["merchant_group_id"];

/// One excluded feed row. A bad row never aborts the run; it is reported
/// here and the remaining rows proceed to detection.
#[derive(Debug, Clone, Serialize)]
pub struct FeedIssue {
    pub row: i64,
    pub field: String,
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FeedBatch {
    pub transactions: Vec<Transaction>,
    pub issues: Vec<FeedIssue>,
    pub rows_read: i64,
}

impl FeedBatch {
    /// Distinct excluded rows; one bad row can carry several issues.
    pub fn excluded_row_count(&self) -> i64 {
        self.issues
            .iter()
            .map(|issue| issue.row)
            .collect::<std::collections::BTreeSet<i64>>()
            .len() as i64
    }
}

#[derive(Debug, Clone)]
struct RawRow {
    row: i64,
    txn_id: Option<String>,
    posted_at: Option<String>,
    amount: Option<String>,
    direction: Option<String>,
    merchant_group_id: Option<String>,
    account_key: Option<String>,
}

/// Parses a normalized transaction feed (JSON array or headered CSV) into
/// validated transactions. Container-level problems (unsupported format,
/// bad headers) are errors; row-level problems are per-row [`FeedIssue`]s.
pub fn parse_feed(content: &str) -> EngineResult<FeedBatch> {
    let raw_rows = parse_source(content)?;
    Ok(validate_rows(raw_rows))
}

fn parse_source(content: &str) -> EngineResult<Vec<RawRow>> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(EngineError::invalid_feed_format(
            "Feed source is empty.",
            "empty",
        ));
    }

    if looks_like_ndjson(trimmed) {
        return Err(EngineError::invalid_feed_format(
            "NDJSON is not supported. Provide a JSON array or CSV.",
            "ndjson",
        ));
    }

    if trimmed.starts_with('[') {
        return parse_json_array(trimmed);
    }

    if looks_like_csv(trimmed) {
        return parse_csv(trimmed);
    }

    if serde_json::from_str::<Value>(trimmed).is_ok() {
        return Err(EngineError::invalid_feed_format(
            "JSON input must be a top-level array of transaction objects.",
            "json_non_array",
        ));
    }

    Err(EngineError::invalid_feed_format(
        "Unsupported feed format. Provide a JSON array or CSV with headers.",
        "unknown",
    ))
}

fn parse_json_array(content: &str) -> EngineResult<Vec<RawRow>> {
    let parsed = serde_json::from_str::<Value>(content).map_err(|_| {
        EngineError::invalid_feed_format("Invalid JSON input. Provide a valid JSON array.", "json")
    })?;

    let Some(items) = parsed.as_array() else {
        return Err(EngineError::invalid_feed_format(
            "JSON input must be a top-level array of transaction objects.",
            "json_non_array",
        ));
    };

    let mut rows = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            return Err(EngineError::invalid_feed_format(
                "JSON array entries must all be objects with transaction fields.",
                "json_non_object_entry",
            ));
        };

        rows.push(RawRow {
            row: (index as i64) + 1,
            txn_id: read_optional_string(object.get("txn_id")),
            posted_at: read_optional_string(object.get("posted_at")),
            amount: read_optional_string(object.get("amount")),
            direction: read_optional_string(object.get("direction")),
            merchant_group_id: read_optional_string(object.get("merchant_group_id")),
            account_key: read_optional_string(object.get("account_key")),
        });
    }

    Ok(rows)
}

fn parse_csv(content: &str) -> EngineResult<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|_| {
            EngineError::invalid_feed_format("CSV header row is missing or unreadable.", "csv")
        })?
        .iter()
        .map(|value| value.trim().to_string())
        .collect::<Vec<String>>();

    if !headers_are_valid(&headers) {
        return Err(EngineError::feed_schema_mismatch(
            REQUIRED_FIELDS.iter().map(|name| name.to_string()).collect(),
            OPTIONAL_FIELDS.iter().map(|name| name.to_string()).collect(),
            headers,
        ));
    }

    let index_by_name = headers
        .iter()
        .enumerate()
        .map(|(index, name)| (name.to_string(), index))
        .collect::<HashMap<String, usize>>();

    let mut rows = Vec::new();
    for (row_index, result_row) in reader.records().enumerate() {
        let record = result_row.map_err(|_| {
            EngineError::invalid_feed_format("CSV rows are malformed or not UTF-8.", "csv")
        })?;

        rows.push(RawRow {
            row: (row_index as i64) + 1,
            txn_id: value_for(&record, &index_by_name, "txn_id"),
            posted_at: value_for(&record, &index_by_name, "posted_at"),
            amount: value_for(&record, &index_by_name, "amount"),
            direction: value_for(&record, &index_by_name, "direction"),
            merchant_group_id: value_for(&record, &index_by_name, "merchant_group_id"),
            account_key: value_for(&record, &index_by_name, "account_key"),
        });
    }

    Ok(rows)
}

fn value_for(
    record: &csv::StringRecord,
    index_by_name: &HashMap<String, usize>,
    name: &str,
) -> Option<String> {
    let index = index_by_name.get(name)?;
    record.get(*index).map(|value| value.to_string())
}

fn validate_rows(raw_rows: Vec<RawRow>) -> FeedBatch {
    let rows_read = raw_rows.len() as i64;
    let mut transactions = Vec::new();
    let mut issues = Vec::new();

    for raw in raw_rows {
        let mut row_issues = Vec::new();

        let txn_id = validate_required_string(raw.row, "txn_id", raw.txn_id, &mut row_issues);
        let posted_at = validate_posted_at(raw.row, raw.posted_at, &mut row_issues);
        let amount = validate_amount(raw.row, raw.amount, &mut row_issues);
        let direction = validate_direction(raw.row, raw.direction, &mut row_issues);
        let account_key =
            validate_required_string(raw.row, "account_key", raw.account_key, &mut row_issues);
        let merchant_group_id = normalize_optional(raw.merchant_group_id);

        if row_issues.is_empty() {
            transactions.push(Transaction {
                txn_id: txn_id.unwrap_or_default(),
                posted_at: posted_at.unwrap_or_default(),
                amount: amount.unwrap_or_default(),
                direction: direction.unwrap_or(Direction::Expense),
                merchant_group_id,
                account_key: account_key.unwrap_or_default(),
            });
        } else {
            issues.extend(row_issues);
        }
    }

    FeedBatch {
        transactions,
        issues,
        rows_read,
    }
}

fn validate_required_string(
    row: i64,
    field: &str,
    value: Option<String>,
    issues: &mut Vec<FeedIssue>,
) -> Option<String> {
    let normalized = normalize_optional(value);
    if normalized.is_none() {
        issues.push(FeedIssue {
            row,
            field: field.to_string(),
            code: "missing_required_field".to_string(),
            description: format!("{field} must be present and non-empty."),
            expected: Some("non-empty string".to_string()),
            received: Some(String::new()),
        });
    }
    normalized
}

fn validate_posted_at(
    row: i64,
    value: Option<String>,
    issues: &mut Vec<FeedIssue>,
) -> Option<chrono::NaiveDate> {
    let Some(candidate) = normalize_optional(value) else {
        issues.push(FeedIssue {
            row,
            field: "posted_at".to_string(),
            code: "missing_required_field".to_string(),
            description: "posted_at must be present and non-empty.".to_string(),
            expected: Some("YYYY-MM-DD".to_string()),
            received: Some(String::new()),
        });
        return None;
    };

    let Some(date) = parse_iso_date(&candidate) else {
        issues.push(FeedIssue {
            row,
            field: "posted_at".to_string(),
            code: "invalid_date".to_string(),
            description: format!("posted_at must be YYYY-MM-DD; got \"{candidate}\""),
            expected: Some("YYYY-MM-DD".to_string()),
            received: Some(candidate),
        });
        return None;
    };

    Some(date)
}

fn validate_amount(row: i64, value: Option<String>, issues: &mut Vec<FeedIssue>) -> Option<f64> {
    let Some(candidate) = normalize_optional(value) else {
        issues.push(FeedIssue {
            row,
            field: "amount".to_string(),
            code: "missing_required_field".to_string(),
            description: "amount must be present and non-empty.".to_string(),
            expected: Some("number (e.g. -42.15)".to_string()),
            received: Some(String::new()),
        });
        return None;
    };

    let Ok(amount) = candidate.parse::<f64>() else {
        issues.push(FeedIssue {
            row,
            field: "amount".to_string(),
            code: "invalid_number".to_string(),
            description: format!("amount must be numeric; got \"{candidate}\""),
            expected: Some("number (e.g. -42.15)".to_string()),
            received: Some(candidate),
        });
        return None;
    };

    if !amount.is_finite() {
        issues.push(FeedIssue {
            row,
            field: "amount".to_string(),
            code: "invalid_number".to_string(),
            description: format!("amount must be a finite number; got \"{candidate}\""),
            expected: Some("number (e.g. -42.15)".to_string()),
            received: Some(candidate),
        });
        return None;
    }

    if amount == 0.0 {
        issues.push(FeedIssue {
            row,
            field: "amount".to_string(),
            code: "zero_amount".to_string(),
            description: "amount must be non-zero.".to_string(),
            expected: Some("non-zero number".to_string()),
            received: Some(candidate),
        });
        return None;
    }

    Some(amount)
}

fn validate_direction(
    row: i64,
    value: Option<String>,
    issues: &mut Vec<FeedIssue>,
) -> Option<Direction> {
    let Some(candidate) = normalize_optional(value) else {
        issues.push(FeedIssue {
            row,
            field: "direction".to_string(),
            code: "missing_required_field".to_string(),
            description: "direction must be present and non-empty.".to_string(),
            expected: Some("income | expense".to_string()),
            received: Some(String::new()),
        });
        return None;
    };

    let Some(direction) = Direction::parse(&candidate) else {
        issues.push(FeedIssue {
            row,
            field: "direction".to_string(),
            code: "invalid_direction".to_string(),
            description: format!("direction must be `income` or `expense`; got \"{candidate}\""),
            expected: Some("income | expense".to_string()),
            received: Some(candidate),
        });
        return None;
    };

    Some(direction)
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn read_optional_string(value: Option<&Value>) -> Option<String> {
    let current = value?;

    if current.is_null() {
        return None;
    }

    if let Some(string_value) = current.as_str() {
        return Some(string_value.to_string());
    }

    if let Some(number_value) = current.as_f64() {
        return Some(number_value.to_string());
    }

    Some(current.to_string())
}

fn looks_like_ndjson(content: &str) -> bool {
    let lines = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<&str>>();
    if lines.len() < 2 {
        return false;
    }

    lines.iter().all(|line| {
        let parsed = serde_json::from_str::<Value>(line.trim());
        if let Ok(value) = parsed {
            return value.is_object();
        }
        false
    })
}

fn looks_like_csv(content: &str) -> bool {
    let Some(first_line) = content.lines().find(|line| !line.trim().is_empty()) else {
        return false;
    };
    first_line.contains(',')
}

fn headers_are_valid(actual_headers: &[String]) -> bool {
    for required in REQUIRED_FIELDS {
        if !actual_headers.iter().any(|value| value == required) {
            return false;
        }
    }

    for header in actual_headers {
        let allowed = REQUIRED_FIELDS.contains(&header.as_str())
            || OPTIONAL_FIELDS.contains(&header.as_str());
        if !allowed {
            return false;
        }
    }

    true
}

use std::io::Read;
use std::path::Path;

use cadent_engine::report::{
    DetectionData, FeedSummary, PolicyData, TraceData, detection_rows, success,
};
use cadent_engine::{
    DETECTION_POLICY_V1, DETECTION_POLICY_VERSION, EngineError, EngineResult, FeedBatch,
    SuccessEnvelope, detect_with_trace, parse_feed,
};
use chrono::NaiveDate;

#[derive(Debug, Default)]
pub struct RunOptions<'a> {
    pub path: Option<String>,
    pub as_of: Option<String>,
    pub stdin_override: Option<&'a str>,
}

pub fn detect(path: Option<&str>, as_of: Option<&str>) -> EngineResult<SuccessEnvelope> {
    detect_with_options(RunOptions {
        path: path.map(std::string::ToString::to_string),
        as_of: as_of.map(std::string::ToString::to_string),
        stdin_override: None,
    })
}

#[doc(hidden)]
pub fn detect_with_options(options: RunOptions<'_>) -> EngineResult<SuccessEnvelope> {
    let (batch, as_of) = load_run_inputs(&options)?;
    let (outcomes, _) = detect_with_trace(&batch.transactions, as_of, DETECTION_POLICY_V1);

    let data = DetectionData {
        policy_version: DETECTION_POLICY_VERSION.to_string(),
        as_of: format_date(as_of),
        feed: feed_summary(&batch),
        feed_issues: batch.issues,
        rows: detection_rows(&outcomes),
    };
    success("detect", data)
}

pub fn trace(path: Option<&str>, as_of: Option<&str>) -> EngineResult<SuccessEnvelope> {
    trace_with_options(RunOptions {
        path: path.map(std::string::ToString::to_string),
        as_of: as_of.map(std::string::ToString::to_string),
        stdin_override: None,
    })
}

#[doc(hidden)]
pub fn trace_with_options(options: RunOptions<'_>) -> EngineResult<SuccessEnvelope> {
    let (batch, as_of) = load_run_inputs(&options)?;
    let (outcomes, trace) = detect_with_trace(&batch.transactions, as_of, DETECTION_POLICY_V1);

    let data = TraceData {
        policy_version: DETECTION_POLICY_VERSION.to_string(),
        as_of: format_date(as_of),
        feed: feed_summary(&batch),
        feed_issues: batch.issues,
        rows: detection_rows(&outcomes),
        trace,
    };
    success("trace", data)
}

pub fn policy() -> EngineResult<SuccessEnvelope> {
    let data = PolicyData {
        policy_version: DETECTION_POLICY_VERSION.to_string(),
        policy: DETECTION_POLICY_V1,
    };
    success("policy", data)
}

fn load_run_inputs(options: &RunOptions<'_>) -> EngineResult<(FeedBatch, NaiveDate)> {
    let content = read_feed_source(options)?;
    let batch = parse_feed(&content)?;
    let as_of = resolve_as_of(options.as_of.as_deref())?;
    Ok((batch, as_of))
}

fn read_feed_source(options: &RunOptions<'_>) -> EngineResult<String> {
    let Some(path) = options.path.as_deref() else {
        return Err(EngineError::invalid_argument_for_command(
            "A feed path is required (use `-` for stdin).",
            Some("detect"),
        ));
    };

    if path == "-" {
        if let Some(content) = options.stdin_override {
            return Ok(content.to_string());
        }
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|err| EngineError::feed_read_failed(Path::new("-"), &err.to_string()))?;
        return Ok(content);
    }

    std::fs::read_to_string(path)
        .map_err(|err| EngineError::feed_read_failed(Path::new(path), &err.to_string()))
}

/// The repo's only clock read: `--as-of` falls back to the local calendar
/// date, captured once here and threaded through the whole run.
fn resolve_as_of(as_of: Option<&str>) -> EngineResult<NaiveDate> {
    let Some(value) = as_of else {
        return Ok(chrono::Local::now().date_naive());
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        EngineError::invalid_argument_for_command(
            &format!("`--as-of` must be YYYY-MM-DD; got \"{value}\""),
            Some("detect"),
        )
    })
}

fn feed_summary(batch: &FeedBatch) -> FeedSummary {
    FeedSummary {
        rows_read: batch.rows_read,
        rows_valid: batch.transactions.len() as i64,
        rows_excluded: batch.excluded_row_count(),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::{RunOptions, detect_with_options, policy, trace_with_options};

    const FEED: &str = r#"[
        {"txn_id": "t0", "posted_at": "2025-12-05", "amount": -15.49,
         "direction": "expense", "merchant_group_id": "mg_video", "account_key": "acct"},
        {"txn_id": "t1", "posted_at": "2026-01-05", "amount": -15.49,
         "direction": "expense", "merchant_group_id": "mg_video", "account_key": "acct"},
        {"txn_id": "t2", "posted_at": "2026-02-05", "amount": -15.49,
         "direction": "expense", "merchant_group_id": "mg_video", "account_key": "acct"},
        {"txn_id": "t3", "posted_at": "2026-03-05", "amount": -15.49,
         "direction": "expense", "merchant_group_id": "mg_video", "account_key": "acct"}
    ]"#;

    #[test]
    fn detect_reads_stdin_when_path_is_dash() {
        let result = detect_with_options(RunOptions {
            path: Some("-".to_string()),
            as_of: Some("2026-03-10".to_string()),
            stdin_override: Some(FEED),
        });
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(envelope.command, "detect");
            assert_eq!(envelope.data["as_of"], "2026-03-10");
            assert_eq!(envelope.data["rows"][0]["merchant_group_id"], "mg_video");
        }
    }

    #[test]
    fn trace_payload_includes_stage_records() {
        let result = trace_with_options(RunOptions {
            path: Some("-".to_string()),
            as_of: Some("2026-03-10".to_string()),
            stdin_override: Some(FEED),
        });
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(envelope.command, "trace");
            assert_eq!(
                envelope.data["trace"]["groups"][0]["clusters"][0]["resolution"]["state"],
                "accepted"
            );
        }
    }

    #[test]
    fn missing_path_is_an_invalid_argument() {
        let result = detect_with_options(RunOptions::default());
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "invalid_argument");
        }
    }

    #[test]
    fn unreadable_file_is_a_feed_read_failure() {
        let result = detect_with_options(RunOptions {
            path: Some("/nonexistent/rows.json".to_string()),
            as_of: Some("2026-03-10".to_string()),
            stdin_override: None,
        });
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "feed_read_failed");
        }
    }

    #[test]
    fn policy_reports_version_and_thresholds() {
        let result = policy();
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(envelope.data["policy_version"], "detection/v1");
            assert_eq!(envelope.data["policy"]["min_confidence"], 0.5);
        }
    }
}

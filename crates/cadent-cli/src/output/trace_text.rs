use std::io;

use serde_json::Value;

use super::detect_text::feed_summary_lines;

/// Per-group stage narrative for the diagnostic path. Every number shown
/// here comes from the shared pipeline's trace; nothing is recomputed.
pub fn render_trace(data: &Value) -> io::Result<String> {
    let groups = data
        .get("trace")
        .and_then(|trace| trace.get("groups"))
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("trace output requires trace groups"))?;
    let accepted = data
        .get("rows")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);
    let as_of = data.get("as_of").and_then(Value::as_str).unwrap_or("today");

    let mut lines = vec![format!(
        "{} of {} candidate groups accepted as of {as_of}.",
        accepted,
        groups.len()
    )];

    for group in groups {
        lines.push(String::new());
        lines.push(format!(
            "{} ({}, {})",
            text(group, "merchant_group_id"),
            text(group, "direction"),
            text(group, "account_key"),
        ));
        lines.push(format!(
            "  transactions: {}  segments: {}  active segment: {}",
            int(group, "transaction_count"),
            int(group, "segment_count"),
            int(group, "active_segment_size"),
        ));

        if let Some(skip) = group.get("skip").and_then(Value::as_str) {
            lines.push(format!("  skipped: {}", skip_label(skip)));
            continue;
        }

        let clusters = group
            .get("clusters")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for cluster in &clusters {
            lines.push(format!(
                "  cluster {:.2} x{}: {}",
                cluster.get("amount").and_then(Value::as_f64).unwrap_or(0.0),
                int(cluster, "occurrence_count"),
                cluster_line(cluster),
            ));
        }
    }

    lines.extend(feed_summary_lines(data));
    Ok(lines.join("\n"))
}

fn cluster_line(cluster: &Value) -> String {
    let mut pieces = Vec::new();
    if let Some(cadence) = cluster.get("cadence").filter(|value| !value.is_null()) {
        pieces.push(format!(
            "{} (median {}d, mad {})",
            text(cadence, "frequency"),
            cadence
                .get("median_interval_days")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            cadence.get("mad").and_then(Value::as_f64).unwrap_or(0.0),
        ));
    }
    if let Some(confidence) = cluster.get("confidence").and_then(Value::as_f64) {
        pieces.push(format!("confidence {confidence:.2}"));
    }

    let resolution = cluster.get("resolution").cloned().unwrap_or(Value::Null);
    match resolution.get("state").and_then(Value::as_str) {
        Some("accepted") => pieces.push("accepted".to_string()),
        Some("rejected") => pieces.push(format!(
            "rejected at {}: {}",
            text(&resolution, "stage"),
            text(&resolution, "reason"),
        )),
        _ => pieces.push("unresolved".to_string()),
    }

    pieces.join(", ")
}

fn skip_label(skip: &str) -> &str {
    match skip {
        "below_minimum_size" => "fewer than 3 transactions",
        "no_qualifying_cluster" => "no amount cluster qualified",
        other => other,
    }
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("unknown")
}

fn int(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_trace;

    #[test]
    fn renders_group_blocks_with_resolutions() {
        let data = json!({
            "as_of": "2026-03-10",
            "rows": [{"merchant_group_id": "mg_video"}],
            "feed": {"rows_read": 6, "rows_valid": 6, "rows_excluded": 0},
            "feed_issues": [],
            "trace": {"groups": [
                {
                    "merchant_group_id": "mg_video",
                    "direction": "expense",
                    "account_key": "acct",
                    "transaction_count": 4,
                    "segment_count": 1,
                    "active_segment_size": 4,
                    "clusters": [{
                        "amount": 15.49,
                        "occurrence_count": 4,
                        "cadence": {"frequency": "monthly", "median_interval_days": 31.0, "mad": 0.5},
                        "confidence": 0.93,
                        "resolution": {"state": "accepted"}
                    }]
                },
                {
                    "merchant_group_id": "mg_once",
                    "direction": "expense",
                    "account_key": "acct",
                    "transaction_count": 1,
                    "segment_count": 0,
                    "active_segment_size": 0,
                    "skip": "below_minimum_size",
                    "clusters": []
                }
            ]}
        });

        let rendered = render_trace(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("1 of 2 candidate groups accepted as of 2026-03-10."));
            assert!(text.contains("mg_video (expense, acct)"));
            assert!(text.contains("cluster 15.49 x4: monthly (median 31d, mad 0.5), confidence 0.93, accepted"));
            assert!(text.contains("skipped: fewer than 3 transactions"));
        }
    }

    #[test]
    fn rejected_clusters_show_stage_and_reason() {
        let data = json!({
            "as_of": "2026-03-10",
            "rows": [],
            "trace": {"groups": [{
                "merchant_group_id": "mg_gym",
                "direction": "expense",
                "account_key": "acct",
                "transaction_count": 8,
                "segment_count": 1,
                "active_segment_size": 8,
                "clusters": [{
                    "amount": 45.0,
                    "occurrence_count": 8,
                    "cadence": {"frequency": "monthly", "median_interval_days": 30.0, "mad": 0.0},
                    "confidence": 1.0,
                    "resolution": {
                        "state": "rejected",
                        "stage": "recency",
                        "reason": "120 days since last occurrence exceeds 45.0"
                    }
                }]
            }]}
        });

        let rendered = render_trace(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("rejected at recency: 120 days since last occurrence exceeds 45.0"));
        }
    }
}

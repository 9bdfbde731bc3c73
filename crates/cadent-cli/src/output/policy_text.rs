use std::io;

use serde_json::Value;

use super::format::key_value_rows;

pub fn render_policy(data: &Value) -> io::Result<String> {
    let policy = data
        .get("policy")
        .ok_or_else(|| io::Error::other("policy output requires a policy object"))?;
    let version = data
        .get("policy_version")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let mut lines = vec![format!("Active detection policy: {version}"), String::new()];

    let entries = [
        ("Lookback months:", number(policy, "lookback_months")),
        ("Minimum group size:", number(policy, "min_group_size")),
        ("Gap tolerance (days):", number(policy, "gap_tolerance_days")),
        ("Minimum cluster size:", number(policy, "min_cluster_size")),
        ("Fallback cluster size:", number(policy, "fallback_cluster_size")),
        ("Anchor tolerance ratio:", number(policy, "anchor_tolerance_ratio")),
        (
            "Validation tolerance ratio:",
            number(policy, "validation_tolerance_ratio"),
        ),
        (
            "Minimum date consistency:",
            number(policy, "min_date_consistency"),
        ),
        ("Maximum MAD ratio:", number(policy, "max_mad_ratio")),
        ("Minimum confidence:", number(policy, "min_confidence")),
        ("Recency multiplier:", number(policy, "recency_multiplier")),
        (
            "Biweekly recency floor (days):",
            number(policy, "biweekly_recency_floor_days"),
        ),
    ];
    lines.extend(key_value_rows(&entries, 2));

    Ok(lines.join("\n"))
}

fn number(policy: &Value, key: &str) -> String {
    match policy.get(key) {
        Some(Value::Number(value)) => value.to_string(),
        _ => "unknown".to_string(),
    }
}

use std::io;

use serde_json::Value;

use super::format::{self, Align, Column};

pub fn render_detect(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("detect output requires rows"))?;
    let as_of = data.get("as_of").and_then(Value::as_str).unwrap_or("today");

    let mut lines = Vec::new();
    if rows.is_empty() {
        lines.push("No recurring patterns found.".to_string());
        lines.push(String::new());
        lines.push(format!(
            "No merchant in this feed shows an active periodic pattern as of {as_of}."
        ));
        lines.push("Run `cadent trace <path>` to see each rejection reason.".to_string());
    } else {
        lines.push(format!(
            "{} recurring patterns detected as of {as_of}.",
            rows.len()
        ));
        lines.push(String::new());
        lines.push("Patterns:".to_string());

        let columns = [
            Column {
                name: "Merchant",
                align: Align::Left,
            },
            Column {
                name: "Account",
                align: Align::Left,
            },
            Column {
                name: "Direction",
                align: Align::Left,
            },
            Column {
                name: "Frequency",
                align: Align::Left,
            },
            Column {
                name: "Amount",
                align: Align::Right,
            },
            Column {
                name: "Confidence",
                align: Align::Right,
            },
            Column {
                name: "Next Expected",
                align: Align::Left,
            },
        ];
        let table_rows = rows
            .iter()
            .map(|row| {
                vec![
                    text_cell(row, "merchant_group_id"),
                    text_cell(row, "account_key"),
                    text_cell(row, "direction"),
                    text_cell(row, "frequency"),
                    format!(
                        "{:.2}",
                        row.get("representative_amount")
                            .and_then(Value::as_f64)
                            .unwrap_or(0.0)
                    ),
                    format!(
                        "{:.2}",
                        row.get("confidence").and_then(Value::as_f64).unwrap_or(0.0)
                    ),
                    text_cell(row, "next_expected_at"),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(format::render_table(&columns, &table_rows));
    }

    lines.extend(feed_summary_lines(data));
    Ok(lines.join("\n"))
}

pub fn feed_summary_lines(data: &Value) -> Vec<String> {
    let Some(feed) = data.get("feed") else {
        return Vec::new();
    };
    let rows_read = feed.get("rows_read").and_then(Value::as_i64).unwrap_or(0);
    let rows_excluded = feed
        .get("rows_excluded")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let mut lines = vec![
        String::new(),
        "Feed:".to_string(),
        format!("  Rows read:      {rows_read}"),
        format!("  Rows excluded:  {rows_excluded}"),
    ];

    if let Some(issues) = data.get("feed_issues").and_then(Value::as_array)
        && !issues.is_empty()
    {
        lines.push("  Excluded rows:".to_string());
        for issue in issues {
            lines.push(format!(
                "    row {}: {}",
                issue.get("row").and_then(Value::as_i64).unwrap_or(0),
                issue
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown issue")
            ));
        }
    }

    lines
}

fn text_cell(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

use chrono::{Months, NaiveDate};

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Strict `YYYY-MM-DD` parsing. Rejects anything chrono would coerce
/// (padded years, alternate separators) before handing off to the real
/// calendar validation.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    if !looks_like_iso_date(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// First day of the detection window: `months` calendar months before
/// `now`, clamped at month ends (Mar 31 minus one month is Feb 28/29).
pub fn lookback_start(now: NaiveDate, months: u32) -> NaiveDate {
    now.checked_sub_months(Months::new(months)).unwrap_or(now)
}

fn looks_like_iso_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}

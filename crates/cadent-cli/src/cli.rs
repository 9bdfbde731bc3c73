use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(pub String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn parse_iso_date(value: &str) -> Result<IsoDate, String> {
    if value.len() != 10 {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return Err("date must use YYYY-MM-DD format".to_string());
        }
    }

    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err("date must use valid calendar values".to_string());
    }

    Ok(IsoDate(value.to_string()))
}

/// Extended help shown after `cadent detect --help`.
/// Contains the feed schema and workflow guidance.
pub const DETECT_AFTER_HELP: &str = "\
How detection works:
  Cadent reads a normalized transaction feed, groups it by merchant,
  direction, and funding account, and reports merchants that recur on a
  canonical cadence (weekly, biweekly, monthly, quarterly, yearly).

  Accepted feed formats:
    JSON — one top-level array of transaction objects
    CSV  — one header row with schema field names

  <path> is a local file path.
  To read stdin explicitly, use `-` as the path.
  Example: cat rows.json | cadent detect -

Feed schema:
  JSON example (one top-level array):
  [
    {
      \"txn_id\": \"txn_12345\",
      \"posted_at\": \"2026-01-15\",
      \"amount\": -15.49,
      \"direction\": \"expense\",
      \"merchant_group_id\": \"mg_acme_video\",
      \"account_key\": \"chase_checking_1234\"
    }
  ]

  CSV example (header + rows):
  txn_id,posted_at,amount,direction,merchant_group_id,account_key
  txn_12345,2026-01-15,-15.49,expense,mg_acme_video,chase_checking_1234

Field rules:
  txn_id (required):
    A stable unique transaction identifier.

  posted_at (required):
    Date only, exactly `YYYY-MM-DD`.

  amount (required):
    A signed non-zero number. Sign is informational; grouping uses
    `direction` and clustering uses the absolute value.

  direction (required):
    `income` or `expense`.

  merchant_group_id (optional):
    The merchant-group key assigned by your merchant-matching layer.
    Rows without one are skipped — ungrouped rows cannot recur.

  account_key (required):
    A stable funding-account name. Keep it the same across feeds.

Rows that fail validation are excluded and reported; they never abort
the run. Use `cadent trace <path>` to see why a merchant was rejected.
";

#[derive(Debug, Parser)]
#[command(
    name = "cadent",
    version,
    about = "recurring-transaction detection engine",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect recurring transaction patterns in a normalized feed
    #[command(after_long_help = DETECT_AFTER_HELP)]
    Detect {
        /// Path to a normalized JSON or CSV feed (use `-` for stdin)
        path: Option<String>,
        /// Run the detection as of this date instead of today (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        as_of: Option<IsoDate>,
        /// Emit structured JSON object output for machine parsing
        #[arg(long)]
        json: bool,
    },
    /// Detect with a stage-by-stage record of every accept/reject decision
    Trace {
        /// Path to a normalized JSON or CSV feed (use `-` for stdin)
        path: Option<String>,
        /// Run the detection as of this date instead of today (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        as_of: Option<IsoDate>,
        /// Emit structured JSON object output for machine parsing
        #[arg(long)]
        json: bool,
    },
    /// Show the active detection policy and its thresholds
    Policy {
        /// Emit structured JSON object output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}

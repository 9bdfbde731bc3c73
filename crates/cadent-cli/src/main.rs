mod cli;
mod commands;
mod dispatch;
mod output;

use std::process::ExitCode;

use cadent_engine::EngineError;
use clap::{Parser, error::ErrorKind};
use tracing_subscriber::EnvFilter;

const ROOT_HELP: &str = "Cadent - recurring-transaction detection engine

Usage:
  cadent <command>

Start here:
  cadent detect --help
  cadent policy
";

const TOP_LEVEL_HELP: &str = "Cadent — recurring-transaction detection engine

USAGE: cadent <command>

Detect recurring patterns in a normalized transaction feed:
  cadent detect <path>                                    Report active recurring patterns
  cadent detect <path> --as-of 2026-03-01                 Run as of a fixed date
  cadent detect <path> --json                             Emit machine-readable output

Understand why a merchant was or wasn't detected:
  cadent trace <path>                                     Show every stage decision per merchant
  cadent trace <path> --json                              Same, machine-readable

Inspect the thresholds in force:
  cadent policy                                           Show the active detection policy

Feeds are JSON arrays or headered CSVs of normalized transactions; run
`cadent detect --help` for the schema. Use `-` as the path to read stdin.

Having issues or unexpected output?
  Run `cadent trace <path>` to see stage-by-stage rejection reasons,
  or `cadent <command> --help` for command usage.
";

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if output::write_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let parsed = cli::Cli::try_parse();
    let cli = match parsed {
        Ok(value) => value,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                let body = if is_top_level_help_request(&raw_args) {
                    TOP_LEVEL_HELP.to_string()
                } else {
                    err.to_string()
                };
                if output::write_text(&body).is_err() {
                    return Err(ExitCode::from(2));
                }
                return Ok(ExitCode::SUCCESS);
            }

            let command_hint = command_path_from_args(&raw_args);
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                EngineError::invalid_argument_for_command(&clean_message, command_hint);
            let mode = infer_requested_output_mode(&raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            return Err(ExitCode::from(1));
        }
    };
    let mode = output::mode_for_command(&cli.command);

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

/// Log level comes from `CADENT_LOG` (fall back: errors only). Detection
/// rejections log at `debug`, so `CADENT_LOG=cadent_engine=debug` narrates a
/// run without touching its output.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("CADENT_LOG").unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Strips clap's trailing boilerplate (Usage line, "For more information"
/// hint) so the "What to do next" section is the single source of guidance.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

fn command_path_from_args(raw_args: &[String]) -> Option<&'static str> {
    let first_non_flag = raw_args
        .iter()
        .skip(1)
        .find(|value| !value.starts_with('-'))?;

    match first_non_flag.as_str() {
        "detect" => Some("detect"),
        "trace" => Some("trace"),
        "policy" => Some("policy"),
        _ => None,
    }
}

fn exit_code_for_error(error: &EngineError) -> ExitCode {
    if error.code.starts_with("internal_") {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

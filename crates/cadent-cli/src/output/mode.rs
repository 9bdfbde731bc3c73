use crate::cli::Commands;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Detect { json, .. } | Commands::Trace { json, .. } | Commands::Policy { json } => {
            *json
        }
    };
    if json { OutputMode::Json } else { OutputMode::Text }
}

#[cfg(test)]
mod tests {
    use super::{OutputMode, mode_for_command};
    use crate::cli::parse_from;

    #[test]
    fn json_flag_selects_json_mode_per_command() {
        let cases: [(&[&str], OutputMode); 6] = [
            (&["cadent", "detect", "rows.json"], OutputMode::Text),
            (&["cadent", "detect", "rows.json", "--json"], OutputMode::Json),
            (&["cadent", "trace", "rows.json"], OutputMode::Text),
            (&["cadent", "trace", "rows.json", "--json"], OutputMode::Json),
            (&["cadent", "policy"], OutputMode::Text),
            (&["cadent", "policy", "--json"], OutputMode::Json),
        ];

        for (args, expected) in cases {
            let parsed = parse_from(args);
            assert!(parsed.is_ok(), "failed to parse: {args:?}");
            if let Ok(cli) = parsed {
                assert_eq!(mode_for_command(&cli.command), expected);
            }
        }
    }
}

use cadent_engine::{EngineResult, SuccessEnvelope};

use crate::cli::{Cli, Commands};
use crate::commands;

pub fn dispatch(cli: &Cli) -> EngineResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Detect { path, as_of, .. } => commands::detect(
            path.as_deref(),
            as_of.as_ref().map(|value| value.as_str()),
        ),
        Commands::Trace { path, as_of, .. } => commands::trace(
            path.as_deref(),
            as_of.as_ref().map(|value| value.as_str()),
        ),
        Commands::Policy { .. } => commands::policy(),
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::parse_from;

    use super::dispatch;

    #[test]
    fn policy_dispatches_to_expected_command_name() {
        let parsed = parse_from(["cadent", "policy"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            let response = dispatch(&cli);
            assert!(response.is_ok());
            if let Ok(success) = response {
                assert_eq!(success.command, "policy");
            }
        }
    }

    #[test]
    fn detect_without_a_path_surfaces_the_engine_error() {
        let parsed = parse_from(["cadent", "detect"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            let response = dispatch(&cli);
            assert!(response.is_err());
            if let Err(error) = response {
                assert_eq!(error.code, "invalid_argument");
            }
        }
    }
}

//! Command line arguments
//!
//! ```text
//! stride-sim [SCENARIO] [--config FILE] [--max-ticks N] [--json] [--list]
//! ```

use std::path::PathBuf;

use crate::error::{Result, SimError};
use crate::settings::SimSettings;

/// Parsed command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub scenario: Option<String>,
    pub config: Option<PathBuf>,
    pub max_ticks: Option<u64>,
    /// Print the report as JSON instead of a summary
    pub json: bool,
    /// Print the scenario names and exit
    pub list: bool,
}

impl CliArgs {
    /// Parse arguments, program name excluded
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cli = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--json" => cli.json = true,
                "--list" => cli.list = true,
                "--config" => {
                    let path = args.next().ok_or_else(|| missing_value("--config"))?;
                    cli.config = Some(PathBuf::from(path));
                }
                "--max-ticks" => {
                    let value = args.next().ok_or_else(|| missing_value("--max-ticks"))?;
                    let ticks = value.parse().map_err(|_| {
                        SimError::InvalidArgument(format!("--max-ticks expects a tick count, got {:?}", value))
                    })?;
                    cli.max_ticks = Some(ticks);
                }
                flag if flag.starts_with("--") => {
                    return Err(SimError::InvalidArgument(format!("unknown flag {}", flag)));
                }
                _ => {
                    if cli.scenario.is_some() {
                        return Err(SimError::InvalidArgument(format!("unexpected argument {}", arg)));
                    }
                    cli.scenario = Some(arg);
                }
            }
        }
        Ok(cli)
    }

    /// Layer the command line over already loaded settings
    pub fn apply(&self, settings: &mut SimSettings) {
        if let Some(scenario) = &self.scenario {
            settings.scenario = Some(scenario.clone());
        }
        if let Some(max_ticks) = self.max_ticks {
            settings.max_ticks = Some(max_ticks);
        }
    }
}

fn missing_value(flag: &str) -> SimError {
    SimError::InvalidArgument(format!("{} needs a value", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = CliArgs::parse(["wait", "--config", "run.toml", "--max-ticks", "500", "--json"]).unwrap();
        assert_eq!(cli.scenario.as_deref(), Some("wait"));
        assert_eq!(cli.config, Some(PathBuf::from("run.toml")));
        assert_eq!(cli.max_ticks, Some(500));
        assert!(cli.json);
        assert!(!cli.list);
    }

    #[test]
    fn test_empty_command_line() {
        let cli = CliArgs::parse(Vec::<String>::new()).unwrap();
        assert_eq!(cli, CliArgs::default());
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(CliArgs::parse(["--max-ticks"]).is_err());
        assert!(CliArgs::parse(["--max-ticks", "soon"]).is_err());
        assert!(CliArgs::parse(["--fast"]).is_err());
        assert!(CliArgs::parse(["wait", "hybrid"]).is_err());
    }

    #[test]
    fn test_command_line_wins_over_settings() {
        let mut settings = SimSettings {
            scenario: Some("wait".to_string()),
            max_ticks: Some(100),
            ..Default::default()
        };
        let cli = CliArgs::parse(["hybrid"]).unwrap();
        cli.apply(&mut settings);
        assert_eq!(settings.scenario.as_deref(), Some("hybrid"));
        assert_eq!(settings.max_ticks, Some(100));
    }
}

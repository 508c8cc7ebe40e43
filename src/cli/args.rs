//! Command-line argument parsing for OutbreakCast
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::cli::config::Config;
use crate::data::{DataSource, DatasetInputs};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// OutbreakCast - district-week fever forecasts with risk banding
#[derive(Parser, Debug)]
#[command(name = "outbreakcast")]
#[command(version)]
#[command(
    about = "District-week fever forecasts with Green / Amber / Red risk banding",
    long_about = None
)]
pub struct Args {
    /// forecasts.csv (path, http(s) URL, or - for stdin)
    #[arg(long, value_name = "SRC", global = true)]
    pub forecasts: Option<String>,

    /// risk_bands.csv (path, http(s) URL, or - for stdin)
    #[arg(long, value_name = "SRC", global = true)]
    pub risk_bands: Option<String>,

    /// Optional weekly history with dengue_cases or cases
    #[arg(long, value_name = "SRC", global = true)]
    pub history: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed for the synthetic demo data
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// State / district / week selection shared by several commands
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionArgs {
    /// State, or (All)
    #[arg(long)]
    pub state: Option<String>,

    /// District, or (All)
    #[arg(long)]
    pub district: Option<String>,

    /// Week start (YYYY-MM-DD), or (All)
    #[arg(long)]
    pub week: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive dashboard
    Start,

    /// Print KPIs, risk-band distribution and the selected rows
    Summary {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Show at most this many table rows
        #[arg(long)]
        limit: Option<usize>,

        /// Emit JSON instead of the terminal view
        #[arg(long)]
        json: bool,
    },

    /// Write the selected rows as CSV
    Export {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output file (default: filtered_risk_bands.csv in the export dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show one district's trailing history and forecast
    Trend {
        /// District name
        #[arg(long)]
        district: String,

        /// Weeks of history to show
        #[arg(long)]
        window: Option<usize>,

        /// Emit JSON instead of the terminal view
        #[arg(long)]
        json: bool,
    },

    /// Derive risk_bands.csv from --forecasts
    Bands {
        /// Output file
        #[arg(short, long, default_value = "risk_bands.csv")]
        output: PathBuf,
    },

    /// Write the synthetic demo as forecasts.csv and risk_bands.csv
    Demo {
        /// Directory to write into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Validate inputs and environment
    Doctor,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags, falling back to the configured default
    pub fn verbosity(&self, config: &Config) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::parse(&config.display.default_verbosity)
                    .unwrap_or(Verbosity::Normal),
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Data sources: flags win over the `[data]` config section
    pub fn inputs(&self, config: &Config) -> DatasetInputs {
        let pick = |flag: &Option<String>, configured: &Option<String>| {
            flag.as_deref()
                .or(configured.as_deref())
                .map(DataSource::parse)
        };

        DatasetInputs {
            forecasts: pick(&self.forecasts, &config.data.forecasts),
            risk_bands: pick(&self.risk_bands, &config.data.risk_bands),
            history: pick(&self.history, &config.data.history),
        }
    }

    /// Whether ANSI colours should be used
    pub fn color_enabled(&self, config: &Config) -> bool {
        !self.no_color && config.display.color_output
    }

    /// Check flag combinations clap cannot express
    pub fn validate(&self, config: &Config) -> Result<(), String> {
        if self.quiet && self.verbose > 0 {
            return Err("Cannot combine --quiet with --verbose.".to_string());
        }

        if matches!(self.command, Some(Commands::Bands { .. }))
            && self.inputs(config).forecasts.is_none()
        {
            return Err(
                "'bands' needs --forecasts (or [data] forecasts in the config).".to_string(),
            );
        }

        let inputs = self.inputs(config);
        let stdin_sources = [&inputs.forecasts, &inputs.risk_bands, &inputs.history]
            .into_iter()
            .filter(|s| matches!(s, Some(DataSource::Stdin)))
            .count();
        if stdin_sources > 1 {
            return Err("Only one input can be read from stdin ('-').".to_string());
        }

        Ok(())
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "quiet" => Some(Verbosity::Quiet),
            "normal" => Some(Verbosity::Normal),
            "verbose" => Some(Verbosity::Verbose),
            "very_verbose" => Some(Verbosity::VeryVerbose),
            _ => None,
        }
    }

    /// Default `tracing` filter for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }

    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show the telemetry summary
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_quiet() {
        let args = parse(&["outbreakcast", "-q", "summary"]);
        assert_eq!(args.verbosity(&Config::default()), Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_normal() {
        let args = parse(&["outbreakcast", "summary"]);
        assert_eq!(args.verbosity(&Config::default()), Verbosity::Normal);
    }

    #[test]
    fn test_verbosity_from_config() {
        let args = parse(&["outbreakcast", "summary"]);
        let mut config = Config::default();
        config.display.default_verbosity = "verbose".to_string();
        assert_eq!(args.verbosity(&config), Verbosity::Verbose);
    }

    #[test]
    fn test_verbosity_very_verbose() {
        let args = parse(&["outbreakcast", "-vv", "summary"]);
        assert_eq!(args.verbosity(&Config::default()), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&[
            "outbreakcast",
            "summary",
            "--forecasts",
            "out/forecasts.csv",
            "--state",
            "Delhi",
            "--json",
        ]);
        assert_eq!(args.forecasts.as_deref(), Some("out/forecasts.csv"));
        match args.command {
            Some(Commands::Summary { selection, json, .. }) => {
                assert_eq!(selection.state.as_deref(), Some("Delhi"));
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_config_sources() {
        let args = parse(&["outbreakcast", "--forecasts", "cli.csv", "summary"]);
        let mut config = Config::default();
        config.data.forecasts = Some("config.csv".to_string());
        config.data.risk_bands = Some("https://example.org/risk_bands.csv".to_string());

        let inputs = args.inputs(&config);
        assert_eq!(inputs.forecasts, Some(DataSource::parse("cli.csv")));
        assert_eq!(
            inputs.risk_bands,
            Some(DataSource::Url("https://example.org/risk_bands.csv".to_string()))
        );
        assert!(inputs.history.is_none());
    }

    #[test]
    fn test_validate_bands_needs_forecasts() {
        let args = parse(&["outbreakcast", "bands"]);
        assert!(args.validate(&Config::default()).is_err());

        let args = parse(&["outbreakcast", "--forecasts", "f.csv", "bands"]);
        assert!(args.validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_single_stdin_source() {
        let args = parse(&["outbreakcast", "--forecasts", "-", "--risk-bands", "-", "summary"]);
        let err = args.validate(&Config::default()).unwrap_err();
        assert!(err.contains("stdin"));

        let mut config = Config::default();
        config.data.history = Some("-".to_string());
        let args = parse(&["outbreakcast", "--forecasts", "-", "summary"]);
        assert!(args.validate(&config).is_err());

        let args = parse(&["outbreakcast", "--forecasts", "-", "--risk-bands", "r.csv", "summary"]);
        assert!(args.validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_quiet_and_verbose() {
        let args = parse(&["outbreakcast", "-q", "-v", "summary"]);
        assert!(args.validate(&Config::default()).is_err());
    }

    #[test]
    fn test_no_color() {
        let args = parse(&["outbreakcast", "--no-color", "summary"]);
        assert!(!args.color_enabled(&Config::default()));
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());

        assert!(!Verbosity::Normal.show_events());
        assert!(Verbosity::Verbose.show_events());

        assert_eq!(Verbosity::VeryVerbose.log_filter(), "debug");
        assert_eq!(Verbosity::parse("quiet"), Some(Verbosity::Quiet));
        assert_eq!(Verbosity::parse("loud"), None);
    }
}

//! Structured logging setup
//!
//! Log lines go to stderr so that `--json` output and CSV written to stdout
//! stay clean.

use crate::cli::Verbosity;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the verbosity-derived filter
pub const LOG_ENV: &str = "OUTBREAKCAST_LOG";

/// Filter from `OUTBREAKCAST_LOG`, or from `verbosity` when unset or invalid
pub fn filter_for(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbosity))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(Verbosity::Quiet);
        init_tracing(Verbosity::VeryVerbose);
    }

    #[test]
    fn test_filter_for_default() {
        if std::env::var(LOG_ENV).is_err() {
            assert_eq!(filter_for(Verbosity::Verbose).to_string(), "info");
        }
    }
}

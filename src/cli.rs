//! Command-line interface for dockhook.
use std::{fmt, path::PathBuf, str::FromStr};

use clap::Parser;
use tracing::level_filters::LevelFilter;

/// Verbosity given with `--log-level`: a level name or a number from 0 (off)
/// to 5 (trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevelArg(LevelFilter);

impl LogLevelArg {
    /// Whether this level lets debug output through.
    pub fn is_debug(&self) -> bool {
        self.0 >= LevelFilter::DEBUG
    }
}

impl fmt::Display for LogLevelArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LogLevelArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        // LevelFilter reads an empty string as "error".
        if trimmed.is_empty() {
            return Err("log level cannot be empty".into());
        }

        trimmed.parse::<LevelFilter>().map(LogLevelArg).map_err(|_| {
            format!(
                "invalid log level '{trimmed}' (expected off, error, warn, info, debug, trace or 0-5)"
            )
        })
    }
}

/// Command-line interface for dockhook.
#[derive(Parser, Debug)]
#[command(name = "dockhook", version, author)]
#[command(
    about = "Run scripts when Thunderbolt docks are authorized or disconnected",
    long_about = None
)]
pub struct Cli {
    /// Path to the configuration file (defaults to `$XDG_CONFIG_HOME/dockhook.yaml`).
    #[arg(short = 'f', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug output, including the stdout of handlers.
    #[arg(short, long)]
    pub debug: bool,

    /// Override the logging verbosity.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevelArg>,

    /// Accept property changes from any sender, for injecting test signals.
    #[arg(short = 't', long = "test-mode", hide = true)]
    pub test_mode: bool,
}

/// Parses command-line arguments and returns a `Cli` struct.
pub fn parse_args() -> Cli {
    Cli::parse()
}

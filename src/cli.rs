//! Command-line interface definitions for qrbatch.
//!
//! Global options (verbosity, color, config location) apply to every
//! subcommand. `scan` opens the interactive station, `send` submits a batch
//! from the command line without a terminal UI.
//!
//! # Example
//!
//! ```bash
//! # Interactive scanning against the configured endpoint
//! qrbatch scan
//!
//! # Use another endpoint and a slower debounce window
//! qrbatch scan --endpoint http://10.0.0.5:1880/send_data --debounce-ms 250
//!
//! # Headless submit, values from stdin
//! printf 'A\nB\n' | qrbatch send --output json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ConfigOverrides;

/// Scan QR codes into a batch and submit it to an HTTP endpoint.
#[derive(Debug, Parser)]
#[command(name = "qrbatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Path to the configuration file
    ///
    /// If not specified, a default platform-specific path is used.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write log output to a file
    ///
    /// The interactive station owns the terminal, so without this flag it
    /// does not log at all.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open the interactive scanning station
    Scan(ScanArgs),
    /// Submit values given on the command line or stdin
    Send(SendArgs),
}

impl Commands {
    /// Whether this command takes over the terminal.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Scan(_))
    }
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Submission endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Ignore recognition events for this long after an accepted scan
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Decoder command printing one scanned value per line
    #[arg(long = "capture-cmd", value_name = "COMMAND")]
    pub capture_command: Option<String>,

    /// Color theme
    #[arg(long, value_enum)]
    pub theme: Option<ThemeArg>,

    /// Give up on a submit request after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

impl ScanArgs {
    /// Flags that override configuration values.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            debounce_ms: self.debounce_ms,
            request_timeout_secs: self.timeout_secs,
            capture_command: self.capture_command.clone(),
            theme: self.theme,
        }
    }
}

/// Arguments for the send subcommand.
#[derive(Debug, Args)]
pub struct SendArgs {
    /// Values to submit, in order (read from stdin, one per line, if omitted)
    #[arg(value_name = "VALUE")]
    pub values: Vec<String>,

    /// Submission endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Give up on the request after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl SendArgs {
    /// Flags that override configuration values.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            request_timeout_secs: self.timeout_secs,
            ..ConfigOverrides::default()
        }
    }
}

/// Output format for the send result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON object for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Color theme selection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThemeArg {
    /// Detect from the terminal environment
    #[default]
    Auto,
    /// Light background
    Light,
    /// Dark background
    Dark,
}

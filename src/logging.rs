//! Logging infrastructure for qrbatch.
//!
//! Structured logging through the `log` facade with an `env_logger` backend.
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! The interactive station draws on the terminal, so log lines there would
//! corrupt the display. It either logs to `--log-file` or not at all.
//!
//! # Example
//!
//! ```rust,no_run
//! use qrbatch::logging::{init_logging, LogTarget};
//!
//! // Headless command: info level on stderr
//! init_logging(0, false, LogTarget::Stderr).unwrap();
//! ```

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::error::Result;

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error (headless commands)
    Stderr,
    /// Append to a file
    File(PathBuf),
    /// Logging disabled
    Off,
}

impl LogTarget {
    /// Pick the target for a command.
    #[must_use]
    pub fn select(log_file: Option<PathBuf>, interactive: bool) -> Self {
        match log_file {
            Some(path) => Self::File(path),
            None if interactive => Self::Off,
            None => Self::Stderr,
        }
    }
}

/// Initialize the logging subsystem.
///
/// Call once, before any logging calls are made.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by RUST_LOG)
/// * `target` - Destination for log lines
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
///
/// # Panics
///
/// Panics if called more than once, as `env_logger` can only be initialized
/// once per process.
pub fn init_logging(verbose: u8, quiet: bool, target: LogTarget) -> Result<()> {
    let mut builder = Builder::new();

    let use_env = env::var("RUST_LOG").is_ok();
    match &target {
        LogTarget::Off => {
            builder.filter_level(LevelFilter::Off);
        }
        _ if use_env => {
            builder.parse_default_env();
        }
        _ => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }

    if let LogTarget::File(path) = &target {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(file)));
        builder.write_style(env_logger::WriteStyle::Never);
    }

    configure_format(&mut builder, verbose);
    builder.init();

    if use_env {
        log::debug!(
            "Logging initialized from RUST_LOG environment variable: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!(
            "Logging initialized at level {:?} ({:?})",
            determine_level(verbose, quiet),
            target
        );
    }
    Ok(())
}

/// Determine the log level from CLI flags.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Configure the log format based on build type and verbosity.
///
/// - Debug builds: timestamp, level, module path when verbose
/// - Release builds: compact format (level + message only)
fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_millis();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determine_level_default() {
        assert_eq!(determine_level(0, false), LevelFilter::Info);
    }

    #[test]
    fn test_determine_level_verbose() {
        assert_eq!(determine_level(1, false), LevelFilter::Debug);
        assert_eq!(determine_level(2, false), LevelFilter::Trace);
        assert_eq!(determine_level(3, false), LevelFilter::Trace);
    }

    #[test]
    fn test_determine_level_quiet_overrides_verbose() {
        assert_eq!(determine_level(0, true), LevelFilter::Error);
        assert_eq!(determine_level(2, true), LevelFilter::Error);
    }

    #[test]
    fn test_log_target_select() {
        let path = PathBuf::from("/tmp/qrbatch.log");
        assert_eq!(
            LogTarget::select(Some(path.clone()), true),
            LogTarget::File(path)
        );
        assert_eq!(LogTarget::select(None, true), LogTarget::Off);
        assert_eq!(LogTarget::select(None, false), LogTarget::Stderr);
    }
}

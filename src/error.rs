//! Error types, exit codes and structured error output.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using the qrbatch error type.
pub type Result<T> = std::result::Result<T, QrBatchError>;

/// Library error type.
///
/// None of these are fatal to a scanning session: a failed submit leaves the
/// batch and the debouncer untouched.
#[derive(Error, Debug)]
pub enum QrBatchError {
    /// HTTP transport failed before a response was obtained
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout
    #[error("request timed out after {0} s")]
    Timeout(u64),

    /// Configuration could not be loaded or saved
    #[error("configuration error: {0}")]
    Config(String),

    /// The capture command could not be started or stopped
    #[error("capture error: {0}")]
    Capture(std::io::Error),

    /// Reading or writing a local file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The presentation layer could not show a notification
    #[error("notification could not be delivered: {0}")]
    Notify(String),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<figment::Error> for QrBatchError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Exit codes for the qrbatch application.
///
/// - 0: Success (batch accepted, or interactive session ended normally)
/// - 1: General error (unexpected failure)
/// - 2: Nothing to send (empty batch)
/// - 3: Rejected (remote answered with a non-success status)
/// - 4: Transport failure (no response obtained)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the batch was accepted or the session ended normally.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Nothing to send: no non-empty values were given.
    NothingToSend = 2,
    /// Rejected: the endpoint returned a non-success status.
    Rejected = 3,
    /// Transport failure: the endpoint could not be reached.
    TransportFailed = 4,
    /// Interrupted: interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "QB000",
            Self::GeneralError => "QB001",
            Self::NothingToSend => "QB002",
            Self::Rejected => "QB003",
            Self::TransportFailed => "QB004",
            Self::Interrupted => "QB130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "QB001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::NothingToSend.as_i32(), 2);
        assert_eq!(ExitCode::Rejected.as_i32(), 3);
        assert_eq!(ExitCode::TransportFailed.as_i32(), 4);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_code_prefix_matches_number() {
        for code in [
            ExitCode::Success,
            ExitCode::GeneralError,
            ExitCode::NothingToSend,
            ExitCode::Rejected,
            ExitCode::TransportFailed,
            ExitCode::Interrupted,
        ] {
            assert!(code.code_prefix().ends_with(&format!("{:03}", code.as_i32())));
        }
    }

    #[test]
    fn test_structured_error_json() {
        let err = anyhow::anyhow!("endpoint unreachable");
        let structured = StructuredError::new(&err, ExitCode::TransportFailed);
        let json = serde_json::to_value(&structured).unwrap();

        assert_eq!(json["code"], "QB004");
        assert_eq!(json["exit_code"], 4);
        assert_eq!(json["message"], "endpoint unreachable");
        assert_eq!(json["interrupted"], false);
    }

    #[test]
    fn test_io_error_is_not_a_capture_error() {
        fn read_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/qrbatch/config.toml")?)
        }

        let err = read_missing().unwrap_err();
        assert!(matches!(err, QrBatchError::Io(_)));
        assert!(!err.to_string().contains("capture"));
    }

    #[test]
    fn test_timeout_display() {
        let err = QrBatchError::Timeout(30);
        assert_eq!(err.to_string(), "request timed out after 30 s");
    }
}

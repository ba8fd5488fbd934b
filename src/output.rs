//! Result output for the headless `send` command.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "endpoint": "http://192.168.0.1:1880/send_data",
//!   "count": 2,
//!   "values": ["A", "B"],
//!   "outcome": "accepted",
//!   "status": 200,
//!   "body": "ok",
//!   "exit_code": 0,
//!   "exit_code_name": "QB000",
//!   "at": "2026-10-16T09:30:00+02:00"
//! }
//! ```
//!
//! A transport failure carries `reason` instead of `status` and `body`.

use std::io::Write;

use chrono::{DateTime, Local};
use serde::Serialize;
use yansi::Paint;

use crate::batch::CodeValue;
use crate::error::ExitCode;
use crate::submit::SubmitOutcome;

/// Exit code for a submit outcome.
#[must_use]
pub fn exit_code_for(outcome: &SubmitOutcome) -> ExitCode {
    match outcome {
        SubmitOutcome::Accepted { .. } => ExitCode::Success,
        SubmitOutcome::Rejected { .. } => ExitCode::Rejected,
        SubmitOutcome::TransportFailed { .. } => ExitCode::TransportFailed,
    }
}

/// Everything reported about one headless submit.
#[derive(Debug, Clone, Serialize)]
pub struct SendReport {
    /// Endpoint the batch was sent to
    pub endpoint: String,
    /// Number of values sent
    pub count: usize,
    /// Values sent, in order
    pub values: Vec<CodeValue>,
    /// What happened
    #[serde(flatten)]
    pub outcome: SubmitOutcome,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "QB003")
    pub exit_code_name: String,
    /// When the outcome was known
    pub at: DateTime<Local>,
}

impl SendReport {
    /// Build a report stamped with the current time.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, values: Vec<CodeValue>, outcome: SubmitOutcome) -> Self {
        let exit_code = exit_code_for(&outcome);
        Self {
            endpoint: endpoint.into(),
            count: values.len(),
            values,
            outcome,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
            at: Local::now(),
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the JSON report followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_json<W: Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Human-readable summary, colored unless color is disabled.
    #[must_use]
    pub fn to_text(&self) -> String {
        let header = match &self.outcome {
            SubmitOutcome::Accepted { status, .. } => format!(
                "{} {} value(s) accepted (status {})",
                "✓".green().bold(),
                self.count,
                status
            ),
            SubmitOutcome::Rejected { status, .. } => format!(
                "{} {} value(s) rejected (status {}), batch kept",
                "!".yellow().bold(),
                self.count,
                status
            ),
            SubmitOutcome::TransportFailed { reason } => format!(
                "{} could not reach {}: {}",
                "✗".red().bold(),
                self.endpoint,
                reason
            ),
        };

        match &self.outcome {
            SubmitOutcome::Accepted { body, .. } | SubmitOutcome::Rejected { body, .. }
                if !body.is_empty() =>
            {
                format!("{header}\n\n{body}")
            }
            _ => header,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(raw: &[&str]) -> Vec<CodeValue> {
        raw.iter().filter_map(|s| CodeValue::new(*s)).collect()
    }

    #[test]
    fn test_exit_code_for() {
        let accepted = SubmitOutcome::Accepted {
            status: 201,
            body: String::new(),
        };
        let rejected = SubmitOutcome::Rejected {
            status: 500,
            body: String::new(),
        };
        let failed = SubmitOutcome::TransportFailed {
            reason: "refused".to_string(),
        };
        assert_eq!(exit_code_for(&accepted), ExitCode::Success);
        assert_eq!(exit_code_for(&rejected), ExitCode::Rejected);
        assert_eq!(exit_code_for(&failed), ExitCode::TransportFailed);
    }

    #[test]
    fn test_json_schema() {
        let report = SendReport::new(
            "http://h/send",
            values(&["A", "B"]),
            SubmitOutcome::Rejected {
                status: 404,
                body: "missing".to_string(),
            },
        );
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["endpoint"], "http://h/send");
        assert_eq!(json["count"], 2);
        assert_eq!(json["values"], serde_json::json!(["A", "B"]));
        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["status"], 404);
        assert_eq!(json["body"], "missing");
        assert_eq!(json["exit_code"], 3);
        assert_eq!(json["exit_code_name"], "QB003");
        assert!(json["at"].is_string());
    }

    #[test]
    fn test_json_transport_failure() {
        let report = SendReport::new(
            "http://h",
            values(&["A"]),
            SubmitOutcome::TransportFailed {
                reason: "request timed out after 30 s".to_string(),
            },
        );
        let mut out = Vec::new();
        report.write_json(&mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(json["outcome"], "transport_failed");
        assert_eq!(json["reason"], "request timed out after 30 s");
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_text_includes_body() {
        yansi::disable();
        let report = SendReport::new(
            "http://h",
            values(&["A", "B", "C"]),
            SubmitOutcome::Accepted {
                status: 200,
                body: "stored 3".to_string(),
            },
        );
        assert_eq!(
            report.to_text(),
            "✓ 3 value(s) accepted (status 200)\n\nstored 3"
        );
    }
}

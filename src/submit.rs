//! Submit request building, outcomes and user notifications.
//!
//! The endpoint is an opaque template: the encoded batch is appended as the
//! `qr` query parameter without parsing or validating the address.

use std::sync::mpsc::Sender;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::batch::{join_values, CodeValue};
use crate::error::{QrBatchError, Result};
use crate::http::HttpResponse;

/// Name of the query parameter carrying the batch.
pub const QUERY_PARAM: &str = "qr";

/// Build the request URL for a batch.
///
/// Values are comma-joined in order and percent-encoded as a single query
/// parameter value.
///
/// # Examples
///
/// ```
/// use qrbatch::batch::CodeValue;
/// use qrbatch::submit::build_submit_url;
///
/// let values: Vec<CodeValue> = ["A", "B C"].into_iter().filter_map(CodeValue::new).collect();
/// assert_eq!(
///     build_submit_url("http://host/send", &values),
///     "http://host/send?qr=A%2CB%20C"
/// );
/// ```
#[must_use]
pub fn build_submit_url(endpoint: &str, values: &[CodeValue]) -> String {
    let joined = join_values(values);
    let encoded = urlencoding::encode(&joined);
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}{QUERY_PARAM}={encoded}")
}

/// Result of one submit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The endpoint answered with a success status; the batch was cleared.
    Accepted { status: u16, body: String },
    /// The endpoint answered with any other status; the batch was kept.
    Rejected { status: u16, body: String },
    /// No response was obtained; the batch was kept.
    TransportFailed { reason: String },
}

impl SubmitOutcome {
    /// Classify a transport result.
    #[must_use]
    pub fn from_result(result: Result<HttpResponse>) -> Self {
        match result {
            Ok(response) if response.is_success() => Self::Accepted {
                status: response.status,
                body: response.body,
            },
            Ok(response) => Self::Rejected {
                status: response.status,
                body: response.body,
            },
            Err(err) => Self::TransportFailed {
                reason: err.to_string(),
            },
        }
    }

    /// Whether the batch is cleared by this outcome.
    #[must_use]
    pub fn batch_cleared(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// The HTTP status, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Accepted { status, .. } | Self::Rejected { status, .. } => Some(*status),
            Self::TransportFailed { .. } => None,
        }
    }

    /// Build the modal notification shown for this outcome.
    #[must_use]
    pub fn notification(&self) -> Notification {
        match self {
            Self::Accepted { status, body } | Self::Rejected { status, body } => Notification::new(
                "Submit result",
                format!("Status: {status}\n\n{body}"),
                if self.batch_cleared() {
                    NotificationKind::Success
                } else {
                    NotificationKind::Warning
                },
            ),
            Self::TransportFailed { reason } => {
                Notification::new("Submit error", reason.clone(), NotificationKind::Error)
            }
        }
    }
}

/// Severity of a notification, drives its colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

/// A modal message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub at: DateTime<Local>,
}

impl Notification {
    /// Create a notification stamped with the current local time.
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            at: Local::now(),
        }
    }
}

/// Presentation sink for submit outcomes.
pub trait Notifier: Send + Sync {
    /// Show a notification.
    ///
    /// # Errors
    /// Returns [`QrBatchError::Notify`] if the presentation layer is gone.
    fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Forwards notifications to the TUI loop.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: Sender<Notification>,
}

impl ChannelNotifier {
    #[must_use]
    pub fn new(tx: Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        self.tx
            .send(notification.clone())
            .map_err(|e| QrBatchError::Notify(e.to_string()))
    }
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        match notification.kind {
            NotificationKind::Success => {
                log::info!("{}: {}", notification.title, notification.message)
            }
            NotificationKind::Warning => {
                log::warn!("{}: {}", notification.title, notification.message)
            }
            NotificationKind::Error => {
                log::error!("{}: {}", notification.title, notification.message)
            }
        }
        Ok(())
    }
}

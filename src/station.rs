//! The shared batch accumulator and submitter.
//!
//! [`Station`] owns the pending [`Batch`] and the [`SubmissionState`]. It is a
//! cheap cloneable handle: the TUI loop feeds scans into one clone while a
//! submit runs on the async runtime with another.
//!
//! # Locking
//!
//! Both pieces of state sit behind one mutex. Each public operation is a
//! single critical section, in particular the check-then-append of
//! [`Station::add_if_absent`] and the idle→in-flight transition at the start
//! of [`Station::submit`]. The lock is never held across the network await.
//!
//! # Submit lifecycle
//!
//! ```text
//!   idle ──submit (batch non-empty)──▶ in-flight ──response / error──▶ idle
//!     ▲                                                                  │
//!     └──────────────── guard dropped on every exit path ◀──────────────┘
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::batch::{Batch, CodeValue, RECENT_LIMIT};
use crate::capture::CaptureControl;
use crate::debounce::ScanSink;
use crate::http::HttpClient;
use crate::submit::{build_submit_url, Notifier, SubmitOutcome};

/// Whether a submission is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
}

impl SubmissionState {
    /// Check if a submission is running.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}

#[derive(Debug, Default)]
struct StationState {
    batch: Batch,
    submission: SubmissionState,
}

/// Point-in-time view of the station for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationSnapshot {
    /// Number of values in the batch
    pub count: usize,
    /// Most recently added value
    pub last: Option<CodeValue>,
    /// Last few values, most recent first, with 1-based positions
    pub recent: Vec<(usize, CodeValue)>,
    /// Current submission state
    pub submission: SubmissionState,
}

/// Shared handle to the batch and the submission state.
#[derive(Debug, Clone, Default)]
pub struct Station {
    inner: Arc<Mutex<StationState>>,
}

impl Station {
    /// Create a station with an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the values not already present. See [`Batch::add_if_absent`].
    pub fn add_if_absent<I>(&self, values: I) -> Vec<CodeValue>
    where
        I: IntoIterator<Item = CodeValue>,
    {
        let added = self.inner.lock().batch.add_if_absent(values);
        if !added.is_empty() {
            log::debug!("Added {} value(s) to batch", added.len());
        }
        added
    }

    /// Check whether a value is already in the batch.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.inner.lock().batch.contains(value)
    }

    /// Number of values in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().batch.len()
    }

    /// Check whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().batch.is_empty()
    }

    /// Copy of the batch values in order.
    #[must_use]
    pub fn values(&self) -> Vec<CodeValue> {
        self.inner.lock().batch.values().to_vec()
    }

    /// Current submission state.
    #[must_use]
    pub fn submission_state(&self) -> SubmissionState {
        self.inner.lock().submission
    }

    /// Clear the batch unconditionally.
    ///
    /// User-facing resets go through a confirmation step first; this is the
    /// operation that runs once the user has agreed.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        let count = state.batch.len();
        state.batch.clear();
        log::info!("Batch cleared ({} value(s) discarded)", count);
    }

    /// Consistent view of the batch and submission state.
    #[must_use]
    pub fn snapshot(&self) -> StationSnapshot {
        let state = self.inner.lock();
        StationSnapshot {
            count: state.batch.len(),
            last: state.batch.last().cloned(),
            recent: state.batch.recent(RECENT_LIMIT),
            submission: state.submission,
        }
    }

    /// Claim the submitter if idle and the batch is non-empty.
    ///
    /// Returns the values to send together with a guard that puts the state
    /// back to idle when dropped.
    fn begin_submit(&self) -> Option<(Vec<CodeValue>, InFlightGuard)> {
        let mut state = self.inner.lock();
        if state.submission.is_in_flight() {
            log::debug!("Submit ignored: already in flight");
            return None;
        }
        if state.batch.is_empty() {
            log::debug!("Submit ignored: batch is empty");
            return None;
        }
        state.submission = SubmissionState::InFlight;
        let values = state.batch.values().to_vec();
        Some((
            values,
            InFlightGuard {
                inner: Arc::clone(&self.inner),
            },
        ))
    }

    /// Submit the batch to `endpoint`.
    ///
    /// Returns `None` without touching anything when the batch is empty or a
    /// submission is already running. Otherwise stops the capture feed, sends
    /// one request, clears the batch on a success status, shows one
    /// notification and returns the outcome. The state is back to idle by the
    /// time this returns, whatever happened.
    pub async fn submit<C>(
        &self,
        endpoint: &str,
        client: &C,
        capture: &dyn CaptureControl,
        notifier: &dyn Notifier,
    ) -> Option<SubmitOutcome>
    where
        C: HttpClient + ?Sized,
    {
        let (values, _guard) = self.begin_submit()?;

        if let Err(e) = capture.set_active(false) {
            log::warn!("Could not stop capture before submit: {}", e);
        }

        let url = build_submit_url(endpoint, &values);
        log::info!("Submitting {} value(s) to {}", values.len(), endpoint);

        let outcome = SubmitOutcome::from_result(client.get(&url).await);

        if outcome.batch_cleared() {
            self.inner.lock().batch.clear();
            log::info!("Batch accepted and cleared");
        } else {
            log::warn!("Batch retained after failed submit: {:?}", outcome);
        }

        if let Err(e) = notifier.notify(&outcome.notification()) {
            log::error!("Failed to present submit result: {}", e);
        }

        Some(outcome)
    }
}

impl ScanSink for Station {
    fn contains(&self, value: &str) -> bool {
        Station::contains(self, value)
    }

    fn accept(&mut self, values: Vec<CodeValue>) -> Vec<CodeValue> {
        self.add_if_absent(values)
    }
}

/// Returns the submitter to idle when dropped.
struct InFlightGuard {
    inner: Arc<Mutex<StationState>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.lock().submission = SubmissionState::Idle;
        log::trace!("Submission state back to idle");
    }
}

//! Scan debouncing for a live decoder feed.
//!
//! A camera keeps reporting the same physical code on every frame, tens of
//! times per second. [`ScanDebouncer`] turns that noisy stream into discrete
//! "new code detected" events:
//!
//! - While **accepting**, each event is filtered against the current batch and
//!   against itself. If anything new remains it is forwarded to the sink, the
//!   feedback pulse fires and the gate switches to **suppressed**.
//! - While **suppressed**, every event is dropped without looking at it.
//! - The gate returns to accepting once the debounce window has elapsed on the
//!   injected [`Clock`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use qrbatch::batch::Batch;
//! use qrbatch::debounce::{ManualClock, NoFeedback, RecognitionEvent, ScanDebouncer};
//!
//! let clock = ManualClock::new();
//! let mut debouncer = ScanDebouncer::with_clock(Duration::from_millis(100), clock.clone());
//! let mut batch = Batch::new();
//!
//! let event = RecognitionEvent::new(["A"]);
//! assert_eq!(debouncer.on_event(&event, &mut batch, &NoFeedback).len(), 1);
//!
//! // Same frame again inside the window: ignored
//! let event = RecognitionEvent::new(["B"]);
//! assert!(debouncer.on_event(&event, &mut batch, &NoFeedback).is_empty());
//!
//! clock.advance(Duration::from_millis(100));
//! assert_eq!(debouncer.on_event(&event, &mut batch, &NoFeedback).len(), 1);
//! assert_eq!(batch.joined(), "A,B");
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::batch::{Batch, CodeValue};

/// Default debounce window after a successful scan.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// One callback's worth of decoder output.
///
/// May be empty and may contain duplicates or empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionEvent {
    pub values: Vec<String>,
}

impl RecognitionEvent {
    /// Build an event from raw decoded strings.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether the event carries no values at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Source of the current time for the debounce window.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to the debouncer.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Side effect fired once per accepted scan (vibration, beep, flash).
pub trait Feedback {
    fn pulse(&self);
}

/// Feedback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn pulse(&self) {}
}

/// Receiver of newly seen values.
///
/// `contains` is the "already in the batch" check; `accept` must itself be an
/// add-if-absent so a value can never be appended twice, and returns the
/// values it actually appended.
pub trait ScanSink {
    fn contains(&self, value: &str) -> bool;
    fn accept(&mut self, values: Vec<CodeValue>) -> Vec<CodeValue>;
}

impl ScanSink for Batch {
    fn contains(&self, value: &str) -> bool {
        Batch::contains(self, value)
    }

    fn accept(&mut self, values: Vec<CodeValue>) -> Vec<CodeValue> {
        self.add_if_absent(values)
    }
}

/// Gate state, private to the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanGate {
    Accepting,
    Suppressed { until: Instant },
}

/// Debounces recognition events before they reach the batch.
#[derive(Debug)]
pub struct ScanDebouncer<C: Clock = SystemClock> {
    clock: C,
    window: Duration,
    gate: ScanGate,
}

impl ScanDebouncer<SystemClock> {
    /// Create a debouncer on the wall clock.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, SystemClock)
    }
}

impl Default for ScanDebouncer<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}

impl<C: Clock> ScanDebouncer<C> {
    /// Create a debouncer with an injected clock.
    pub fn with_clock(window: Duration, clock: C) -> Self {
        Self {
            clock,
            window,
            gate: ScanGate::Accepting,
        }
    }

    /// The configured debounce window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check whether the next event would be looked at.
    ///
    /// Fires the scheduled return to accepting if the window has elapsed.
    pub fn is_accepting(&mut self) -> bool {
        self.resume_if_due();
        self.gate == ScanGate::Accepting
    }

    /// Force the gate back to accepting. Called whenever scanning (re)starts.
    pub fn reset(&mut self) {
        if self.gate != ScanGate::Accepting {
            log::trace!("Scan gate reset to accepting");
        }
        self.gate = ScanGate::Accepting;
    }

    /// Process one recognition event.
    ///
    /// Returns the values forwarded to `sink`; empty when the event was
    /// suppressed or contained nothing new.
    pub fn on_event<S, F>(&mut self, event: &RecognitionEvent, sink: &mut S, feedback: &F) -> Vec<CodeValue>
    where
        S: ScanSink + ?Sized,
        F: Feedback + ?Sized,
    {
        if !self.is_accepting() {
            return Vec::new();
        }

        let mut newly_seen: Vec<CodeValue> = Vec::new();
        for raw in &event.values {
            if sink.contains(raw) || newly_seen.iter().any(|v| v.as_str() == raw) {
                continue;
            }
            if let Some(value) = CodeValue::new(raw.as_str()) {
                newly_seen.push(value);
            }
        }

        if newly_seen.is_empty() {
            return Vec::new();
        }

        // Another writer may have added some of these since `contains`
        let added = sink.accept(newly_seen);
        if added.is_empty() {
            return added;
        }

        log::debug!("Scanned {} new value(s)", added.len());
        self.gate = ScanGate::Suppressed {
            until: self.clock.now() + self.window,
        };
        feedback.pulse();

        added
    }

    fn resume_if_due(&mut self) {
        if let ScanGate::Suppressed { until } = self.gate {
            if self.clock.now() >= until {
                log::trace!("Debounce window elapsed, accepting scans");
                self.gate = ScanGate::Accepting;
            }
        }
    }
}

//! Busy indicator for the headless `send` command using indicatif.
//!
//! A spinner on stderr while the request is in flight. It is hidden when
//! output is quiet, machine-readable, or stderr is not a terminal, so it
//! never mixes with JSON on stdout or with piped logs.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner tick interval.
const TICK: Duration = Duration::from_millis(100);

/// Spinner shown while a submit is running.
pub struct SendSpinner {
    bar: Option<ProgressBar>,
}

impl SendSpinner {
    /// Start a spinner with `message`, or a no-op if `enabled` is false.
    #[must_use]
    pub fn start(message: impl Into<String>, enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.into());
        bar.enable_steady_tick(TICK);
        Self { bar: Some(bar) }
    }

    /// Whether anything is drawn.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    /// Remove the spinner from the terminal.
    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

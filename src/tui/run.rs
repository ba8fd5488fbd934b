//! TUI main loop.
//!
//! This module provides the main entry point for running the interactive
//! station. It handles terminal setup, the event loop, and cleanup on exit.
//!
//! # Terminal Management
//!
//! The TUI takes over the terminal by:
//! - Enabling raw mode (unbuffered input, no echo)
//! - Entering the alternate screen buffer
//! - Hiding the cursor
//!
//! All these changes are reverted on exit, including on panic.
//!
//! # Event Loop
//!
//! Each frame:
//! 1. Show submit outcomes delivered by finished submits
//! 2. Feed decoder output through the debouncer while the camera is on
//! 3. Render the current state
//! 4. Poll for key input and carry out the resulting [`Effect`]
//! 5. Limit frame rate to ~60 FPS
//!
//! Submits run on the tokio runtime; the loop never waits for the network.

use std::io::{self, Stdout, Write};
use std::panic;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use thiserror::Error;
use tokio::runtime::Handle;

use super::app::{App, Effect};
use super::events::EventHandler;
use super::ui::render;
use crate::capture::CaptureControl;
use crate::config::persist_endpoint;
use crate::debounce::{Feedback, RecognitionEvent, ScanDebouncer};
use crate::http::HttpClient;
use crate::station::Station;
use crate::submit::{ChannelNotifier, Notification};

/// Frame rate limit: 60 FPS = ~16.67ms per frame.
const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Event poll timeout: Use the frame duration for responsive rendering.
const POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// Error type for TUI operations.
#[derive(Debug, Error)]
pub enum TuiError {
    /// I/O error from terminal operations.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// Event handling error.
    #[error("event error: {0}")]
    Event(#[from] super::events::EventError),
}

/// Result type for TUI operations.
pub type TuiResult<T> = Result<T, TuiError>;

/// Type alias for the terminal backend.
type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Rings the terminal bell once per accepted scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellFeedback;

impl Feedback for BellFeedback {
    fn pulse(&self) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}

/// Everything the loop drives besides the display state.
pub struct Session {
    station: Station,
    capture: Arc<dyn CaptureControl>,
    scans: Receiver<RecognitionEvent>,
    client: Arc<dyn HttpClient>,
    runtime: Handle,
    debouncer: ScanDebouncer,
    notify_tx: Sender<Notification>,
    notify_rx: Receiver<Notification>,
    config_path: Option<PathBuf>,
}

impl Session {
    /// Assemble a session.
    ///
    /// `scans` must be the receiving end of the channel `capture` writes
    /// to. A new endpoint is saved to `config_path` when one is given.
    #[must_use]
    pub fn new(
        station: Station,
        capture: Arc<dyn CaptureControl>,
        scans: Receiver<RecognitionEvent>,
        client: Arc<dyn HttpClient>,
        runtime: Handle,
        debouncer: ScanDebouncer,
        config_path: Option<PathBuf>,
    ) -> Self {
        let (notify_tx, notify_rx) = mpsc::channel();
        Self {
            station,
            capture,
            scans,
            client,
            runtime,
            debouncer,
            notify_tx,
            notify_rx,
            config_path,
        }
    }

    /// The shared station.
    #[must_use]
    pub fn station(&self) -> &Station {
        &self.station
    }

    /// Pull in everything that happened since the last frame.
    ///
    /// Decoder output is only used while the camera is on; anything that
    /// arrives after it was switched off is discarded.
    pub fn sync(&mut self, app: &mut App, feedback: &dyn Feedback) {
        while let Ok(notification) = self.notify_rx.try_recv() {
            app.show_notification(notification);
        }

        if app.camera_active() && !self.capture.is_active() {
            app.set_camera_active(false);
            app.set_status("Camera stopped");
        }

        while let Ok(event) = self.scans.try_recv() {
            if !app.camera_active() {
                log::trace!("Discarding scan received while camera is off");
                continue;
            }
            let added = self
                .debouncer
                .on_event(&event, &mut self.station, feedback);
            if !added.is_empty() {
                app.flash();
            }
        }

        app.update_snapshot(self.station.snapshot());
        app.tick();
    }

    /// Carry out an effect returned by [`App::handle_action`].
    pub fn apply(&mut self, app: &mut App, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::SetCamera(true) => {
                self.debouncer.reset();
                if let Err(e) = self.capture.set_active(true) {
                    log::error!("Failed to start capture: {}", e);
                    app.set_camera_active(false);
                    app.set_status(format!("Camera error: {e}"));
                }
            }
            Effect::SetCamera(false) => {
                if let Err(e) = self.capture.set_active(false) {
                    log::warn!("Failed to stop capture: {}", e);
                }
            }
            Effect::Submit => self.spawn_submit(app.endpoint().to_string()),
            Effect::ClearBatch => self.station.clear(),
            Effect::SaveEndpoint(endpoint) => {
                log::info!("Endpoint changed to {}", endpoint);
                if let Some(path) = &self.config_path {
                    if let Err(e) = persist_endpoint(path, &endpoint) {
                        log::warn!("Failed to save endpoint: {}", e);
                        app.set_status(format!("Endpoint not saved: {e}"));
                    }
                }
            }
        }
    }

    fn spawn_submit(&self, endpoint: String) {
        let station = self.station.clone();
        let capture = Arc::clone(&self.capture);
        let client = Arc::clone(&self.client);
        let notifier = ChannelNotifier::new(self.notify_tx.clone());

        self.runtime.spawn(async move {
            station
                .submit(&endpoint, client.as_ref(), capture.as_ref(), &notifier)
                .await
        });
    }

    /// Stop the capture feed.
    pub fn shutdown(&self) {
        if let Err(e) = self.capture.set_active(false) {
            log::warn!("Failed to stop capture on exit: {}", e);
        }
    }
}

/// Run the interactive TUI.
///
/// Takes over the terminal and runs until the user quits, the shutdown flag
/// is set, or a terminal error occurs. The terminal is always restored.
///
/// # Errors
///
/// Returns `TuiError::Io` for terminal I/O errors.
/// Returns `TuiError::Event` for event handling errors.
pub fn run_tui(
    app: &mut App,
    session: &mut Session,
    shutdown_flag: Option<Arc<AtomicBool>>,
) -> TuiResult<()> {
    // Restore the terminal before the panic message is printed
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let result = run_tui_inner(app, session, shutdown_flag);
    session.shutdown();

    let _ = panic::take_hook();

    result
}

fn run_tui_inner(
    app: &mut App,
    session: &mut Session,
    shutdown_flag: Option<Arc<AtomicBool>>,
) -> TuiResult<()> {
    let mut terminal = setup_terminal()?;
    let event_handler = EventHandler::with_bindings(app.keybindings().clone());
    let feedback = BellFeedback;

    let mut last_render = Instant::now();

    let result = loop {
        if let Some(ref flag) = shutdown_flag {
            if flag.load(Ordering::SeqCst) {
                log::info!("Shutdown signal received, exiting TUI");
                break Ok(());
            }
        }

        if app.should_quit() {
            log::debug!("App requested quit");
            break Ok(());
        }

        session.sync(app, &feedback);

        if let Err(e) = terminal.draw(|frame| render(frame, app)) {
            break Err(e.into());
        }

        match event_handler.poll(POLL_TIMEOUT, app.mode()) {
            Ok(actions) => {
                for action in actions {
                    let effect = app.handle_action(action);
                    session.apply(app, effect);
                }
            }
            Err(e) => break Err(e.into()),
        }

        let elapsed = last_render.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
        last_render = Instant::now();
    };

    restore_terminal()?;

    log::info!("TUI exited");
    result
}

/// Set up the terminal for TUI mode.
fn setup_terminal() -> TuiResult<Terminal> {
    log::debug!("Setting up terminal for TUI");

    terminal::enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        cursor::Hide
    )?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    log::debug!("Terminal setup complete");
    Ok(terminal)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> TuiResult<()> {
    log::debug!("Restoring terminal");

    let _ = terminal::disable_raw_mode();

    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        LeaveAlternateScreen,
        DisableBracketedPaste,
        cursor::Show
    );

    Ok(())
}

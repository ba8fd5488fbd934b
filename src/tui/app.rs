//! TUI application state management.
//!
//! # Overview
//!
//! [`App`] holds everything the screen shows: the current mode, the endpoint
//! and its edit buffer, whether the camera is on, the latest
//! [`StationSnapshot`] and the pending submit notification.
//!
//! # Architecture
//!
//! `App` never talks to the camera, the network or the station directly.
//! [`App::handle_action`] updates the display state and returns an
//! [`Effect`] that the run loop carries out. This keeps every state
//! transition testable without a terminal.
//!
//! # Example
//!
//! ```
//! use qrbatch::tui::app::{Action, App, AppMode, Effect};
//!
//! let mut app = App::new("http://host/send");
//!
//! // Nothing scanned yet: reset has nothing to confirm
//! assert_eq!(app.handle_action(Action::Reset), Effect::None);
//! assert_eq!(app.mode(), AppMode::Ready);
//!
//! assert_eq!(app.handle_action(Action::ToggleCamera), Effect::SetCamera(true));
//! assert!(app.camera_active());
//! ```

use crate::station::StationSnapshot;
use crate::submit::Notification;

use super::keybindings::KeyBindings;
use super::theme::Theme;

/// Frames the accepted-scan highlight stays visible (~250 ms at 60 FPS).
const FLASH_FRAMES: u8 = 15;

/// Application mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Main screen, scanning and commands available
    #[default]
    Ready,
    /// Asking whether to discard the batch
    ConfirmingReset,
    /// Editing the endpoint
    EditingEndpoint,
    /// Showing the outcome of a submit
    ShowingResult,
    /// Application is quitting
    Quitting,
}

impl AppMode {
    /// Check if a modal dialog is open.
    #[must_use]
    pub fn is_modal(&self) -> bool {
        matches!(
            self,
            Self::ConfirmingReset | Self::EditingEndpoint | Self::ShowingResult
        )
    }

    /// Check if the application is done (quitting).
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Quitting)
    }
}

/// User action triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Start or stop the camera
    ToggleCamera,
    /// Send the batch
    Submit,
    /// Ask to discard the batch
    Reset,
    /// Open the endpoint editor
    EditEndpoint,
    /// Confirm the open dialog
    Confirm,
    /// Cancel the open dialog
    Cancel,
    /// Quit the application
    Quit,
    /// Type a character into the endpoint editor
    InputChar(char),
    /// Delete the character before the cursor in the endpoint editor
    InputBackspace,
}

/// Side effect requested by a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Nothing to do outside the app state
    None,
    /// Start (`true`) or stop (`false`) the capture feed
    SetCamera(bool),
    /// Submit the batch to the current endpoint
    Submit,
    /// Discard the batch (the user confirmed)
    ClearBatch,
    /// Use and persist a new endpoint
    SaveEndpoint(String),
}

/// TUI application state.
///
/// Only accessed from the thread that owns the terminal.
#[derive(Debug, Clone)]
pub struct App {
    mode: AppMode,
    endpoint: String,
    edit_buffer: String,
    camera_active: bool,
    snapshot: StationSnapshot,
    notification: Option<Notification>,
    status_message: Option<String>,
    flash: u8,
    theme: Theme,
    keybindings: KeyBindings,
}

impl App {
    /// Create an app in `Ready` mode with the camera off.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            mode: AppMode::Ready,
            endpoint: endpoint.into(),
            edit_buffer: String::new(),
            camera_active: false,
            snapshot: StationSnapshot::default(),
            notification: None,
            status_message: None,
            flash: 0,
            theme: Theme::default(),
            keybindings: KeyBindings::default(),
        }
    }

    /// Builder method to set the theme.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> AppMode {
        self.mode
    }

    /// Check if the app wants to exit.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.mode.is_done()
    }

    /// Endpoint submits go to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Text in the endpoint editor.
    #[must_use]
    pub fn edit_buffer(&self) -> &str {
        &self.edit_buffer
    }

    /// Whether the camera is on.
    #[must_use]
    pub fn camera_active(&self) -> bool {
        self.camera_active
    }

    /// Record the camera state after the run loop changed it.
    pub fn set_camera_active(&mut self, active: bool) {
        self.camera_active = active;
    }

    /// Latest view of the station.
    #[must_use]
    pub fn snapshot(&self) -> &StationSnapshot {
        &self.snapshot
    }

    /// Replace the station view. Called once per frame.
    pub fn update_snapshot(&mut self, snapshot: StationSnapshot) {
        self.snapshot = snapshot;
    }

    /// Whether a submit is running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.snapshot.submission.is_in_flight()
    }

    /// Whether the send command is currently usable.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.is_busy() && self.snapshot.count > 0
    }

    /// Notification being shown, if any.
    #[must_use]
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Show a submit outcome. It replaces whatever dialog was open, except
    /// the endpoint editor, which keeps focus until closed.
    pub fn show_notification(&mut self, notification: Notification) {
        self.notification = Some(notification);
        if self.mode != AppMode::EditingEndpoint && !self.mode.is_done() {
            self.mode = AppMode::ShowingResult;
        }
    }

    /// One-line status shown in the footer.
    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Set the footer status line.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Highlight the batch counter after an accepted scan.
    pub fn flash(&mut self) {
        self.flash = FLASH_FRAMES;
    }

    /// Whether the accepted-scan highlight is visible.
    #[must_use]
    pub fn is_flashing(&self) -> bool {
        self.flash > 0
    }

    /// Advance frame-based animations.
    pub fn tick(&mut self) {
        self.flash = self.flash.saturating_sub(1);
    }

    /// Get the current theme.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Get the key bindings used for input and footer hints.
    #[must_use]
    pub fn keybindings(&self) -> &KeyBindings {
        &self.keybindings
    }

    /// Apply an action and return the effect the run loop must perform.
    pub fn handle_action(&mut self, action: Action) -> Effect {
        if action == Action::Quit {
            self.mode = AppMode::Quitting;
            return Effect::None;
        }

        match self.mode {
            AppMode::Ready => self.handle_ready(action),
            AppMode::ConfirmingReset => self.handle_confirm_reset(action),
            AppMode::EditingEndpoint => self.handle_editing(action),
            AppMode::ShowingResult => self.handle_result(action),
            AppMode::Quitting => Effect::None,
        }
    }

    fn handle_ready(&mut self, action: Action) -> Effect {
        match action {
            Action::ToggleCamera => {
                if self.is_busy() {
                    self.set_status("Sending, camera locked");
                    return Effect::None;
                }
                self.camera_active = !self.camera_active;
                self.status_message = None;
                Effect::SetCamera(self.camera_active)
            }
            Action::Submit => {
                if self.is_busy() {
                    self.set_status("Already sending");
                    Effect::None
                } else if self.snapshot.count == 0 {
                    self.set_status("Nothing to send");
                    Effect::None
                } else {
                    // Submit stops the feed itself
                    self.camera_active = false;
                    self.set_status("Sending...");
                    Effect::Submit
                }
            }
            Action::Reset => {
                if self.snapshot.count > 0 {
                    self.mode = AppMode::ConfirmingReset;
                }
                Effect::None
            }
            Action::EditEndpoint => {
                self.edit_buffer = self.endpoint.clone();
                self.mode = AppMode::EditingEndpoint;
                Effect::None
            }
            Action::Cancel => {
                self.status_message = None;
                Effect::None
            }
            _ => Effect::None,
        }
    }

    fn handle_confirm_reset(&mut self, action: Action) -> Effect {
        match action {
            Action::Confirm => {
                self.mode = AppMode::Ready;
                self.set_status("Batch cleared");
                Effect::ClearBatch
            }
            Action::Cancel => {
                self.mode = AppMode::Ready;
                Effect::None
            }
            _ => Effect::None,
        }
    }

    fn handle_editing(&mut self, action: Action) -> Effect {
        match action {
            Action::InputChar(c) => {
                self.edit_buffer.push(c);
                Effect::None
            }
            Action::InputBackspace => {
                self.edit_buffer.pop();
                Effect::None
            }
            Action::Confirm => {
                let endpoint = self.edit_buffer.trim().to_string();
                self.edit_buffer.clear();
                self.mode = self.mode_after_editor();
                if endpoint.is_empty() || endpoint == self.endpoint {
                    return Effect::None;
                }
                self.endpoint = endpoint.clone();
                self.set_status("Endpoint updated");
                Effect::SaveEndpoint(endpoint)
            }
            Action::Cancel => {
                self.edit_buffer.clear();
                self.mode = self.mode_after_editor();
                Effect::None
            }
            _ => Effect::None,
        }
    }

    fn handle_result(&mut self, action: Action) -> Effect {
        match action {
            Action::Confirm | Action::Cancel => {
                self.notification = None;
                self.mode = AppMode::Ready;
                Effect::None
            }
            _ => Effect::None,
        }
    }

    /// A result that arrived while editing is shown once the editor closes.
    fn mode_after_editor(&self) -> AppMode {
        if self.notification.is_some() {
            AppMode::ShowingResult
        } else {
            AppMode::Ready
        }
    }
}

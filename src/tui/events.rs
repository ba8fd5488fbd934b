//! TUI event handling with crossterm.
//!
//! Polls the terminal for input and turns key presses into [`Action`]s using
//! the mode-aware [`KeyBindings`]. Resize and mouse events produce no action;
//! the next frame redraws at the new size anyway.

use std::time::Duration;

use crossterm::event::{self, Event};
use thiserror::Error;

use super::keybindings::KeyBindings;
use super::{Action, AppMode};

/// Error reading terminal events.
#[derive(Debug, Error)]
pub enum EventError {
    /// Polling or reading from the terminal failed.
    #[error("failed to read terminal event: {0}")]
    Read(#[from] std::io::Error),
}

/// Translates terminal events into actions.
#[derive(Debug, Clone, Default)]
pub struct EventHandler {
    bindings: KeyBindings,
}

impl EventHandler {
    /// Create a handler with the default key bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handler with specific key bindings.
    #[must_use]
    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    /// Key bindings in use.
    #[must_use]
    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Wait up to `timeout` for an event and translate it.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Read`] if the terminal cannot be read.
    pub fn poll(&self, timeout: Duration, mode: AppMode) -> Result<Vec<Action>, EventError> {
        if !event::poll(timeout)? {
            return Ok(Vec::new());
        }
        Ok(self.translate(&event::read()?, mode))
    }

    /// Translate one terminal event.
    ///
    /// A bracketed paste into the endpoint editor becomes one input action
    /// per character; everything else yields at most one action.
    #[must_use]
    pub fn translate(&self, event: &Event, mode: AppMode) -> Vec<Action> {
        match event {
            Event::Key(key) => {
                let action = self.bindings.resolve(key, mode);
                if action.is_none() {
                    log::trace!("Unbound key in {:?}: {:?}", mode, key.code);
                }
                action.into_iter().collect()
            }
            Event::Paste(text) if mode == AppMode::EditingEndpoint => text
                .chars()
                .filter(|c| !c.is_control())
                .map(Action::InputChar)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key_event(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_translate_key() {
        let handler = EventHandler::new();
        assert_eq!(
            handler.translate(&key_event(KeyCode::Char('r')), AppMode::Ready),
            vec![Action::Reset]
        );
        assert_eq!(
            handler.translate(&key_event(KeyCode::Char('r')), AppMode::EditingEndpoint),
            vec![Action::InputChar('r')]
        );
    }

    #[test]
    fn test_translate_resize_is_ignored() {
        let handler = EventHandler::new();
        assert!(handler.translate(&Event::Resize(80, 24), AppMode::Ready).is_empty());
    }

    #[test]
    fn test_paste_into_editor_drops_control_characters() {
        let handler = EventHandler::new();
        let paste = Event::Paste("a/\nb".to_string());
        assert_eq!(
            handler.translate(&paste, AppMode::EditingEndpoint),
            vec![
                Action::InputChar('a'),
                Action::InputChar('/'),
                Action::InputChar('b')
            ]
        );
        assert!(handler.translate(&paste, AppMode::Ready).is_empty());
    }
}

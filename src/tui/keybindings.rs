//! Keybinding configuration for the TUI.
//!
//! Keys resolve differently per [`AppMode`]: the main screen has its own
//! command keys, dialogs only understand confirm/cancel, and the endpoint
//! editor treats printable characters as text.
//!
//! # Example
//!
//! ```
//! use qrbatch::tui::keybindings::KeyBindings;
//! use qrbatch::tui::{Action, AppMode};
//! use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
//!
//! let bindings = KeyBindings::default();
//! let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
//!
//! assert_eq!(bindings.resolve(&enter, AppMode::Ready), Some(Action::Submit));
//! assert_eq!(bindings.resolve(&enter, AppMode::ConfirmingReset), Some(Action::Confirm));
//! ```

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{Action, AppMode};

/// Keybinding configuration mapping actions to key events.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    /// Keys on the main screen.
    main_keys: HashMap<Action, Vec<KeyEvent>>,
    /// Keys inside the reset prompt and the result dialog.
    dialog_keys: HashMap<Action, Vec<KeyEvent>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyBindings {
    /// Create the default bindings.
    #[must_use]
    pub fn new() -> Self {
        let mut main_keys = HashMap::new();
        main_keys.insert(Action::ToggleCamera, vec![key(' '), key('s')]);
        main_keys.insert(Action::Submit, vec![code(KeyCode::Enter), ctrl('s')]);
        main_keys.insert(Action::Reset, vec![key('r')]);
        main_keys.insert(Action::EditEndpoint, vec![key('e')]);
        main_keys.insert(Action::Cancel, vec![code(KeyCode::Esc)]);
        main_keys.insert(Action::Quit, vec![key('q'), ctrl('c')]);

        let mut dialog_keys = HashMap::new();
        dialog_keys.insert(Action::Confirm, vec![key('y'), code(KeyCode::Enter)]);
        dialog_keys.insert(Action::Cancel, vec![key('n'), code(KeyCode::Esc)]);
        dialog_keys.insert(Action::Quit, vec![ctrl('c')]);

        Self {
            main_keys,
            dialog_keys,
        }
    }

    /// Resolve a key event to an action for the given mode.
    ///
    /// Key release events are ignored (some terminals send these).
    #[must_use]
    pub fn resolve(&self, key: &KeyEvent, mode: AppMode) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match mode {
            AppMode::Ready => Self::lookup(&self.main_keys, key),
            AppMode::ConfirmingReset | AppMode::ShowingResult => {
                Self::lookup(&self.dialog_keys, key)
            }
            AppMode::EditingEndpoint => Self::resolve_text_input(key),
            AppMode::Quitting => None,
        }
    }

    fn lookup(map: &HashMap<Action, Vec<KeyEvent>>, key: &KeyEvent) -> Option<Action> {
        map.iter()
            .find(|(_, keys)| keys.iter().any(|k| Self::key_matches(k, key)))
            .map(|(action, _)| *action)
    }

    /// Endpoint editor: everything printable is text.
    fn resolve_text_input(key: &KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return (key.code == KeyCode::Char('c')).then_some(Action::Quit);
        }
        match key.code {
            KeyCode::Enter => Some(Action::Confirm),
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Backspace => Some(Action::InputBackspace),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => {
                Some(Action::InputChar(c))
            }
            _ => None,
        }
    }

    /// Matches code and modifiers, ignoring kind and state.
    ///
    /// SHIFT is ignored for characters since the character already carries
    /// the case.
    fn key_matches(target: &KeyEvent, actual: &KeyEvent) -> bool {
        let strip = |m: KeyModifiers, code: KeyCode| {
            if matches!(code, KeyCode::Char(_)) {
                m.difference(KeyModifiers::SHIFT)
            } else {
                m
            }
        };
        target.code == actual.code
            && strip(target.modifiers, target.code) == strip(actual.modifiers, actual.code)
    }

    /// Human-readable string for the first key bound to an action in a mode.
    ///
    /// Useful for displaying hints in the UI.
    #[must_use]
    pub fn key_hint(&self, action: Action, mode: AppMode) -> String {
        let map = match mode {
            AppMode::ConfirmingReset | AppMode::ShowingResult => &self.dialog_keys,
            _ => &self.main_keys,
        };
        map.get(&action)
            .and_then(|keys| keys.first())
            .map_or_else(String::new, Self::format_key)
    }

    /// Format a key event as a human-readable string.
    #[must_use]
    pub fn format_key(key: &KeyEvent) -> String {
        let mut parts = Vec::new();

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl");
        }
        if key.modifiers.contains(KeyModifiers::ALT) {
            parts.push("Alt");
        }

        let key_name = match key.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            _ => "?".to_string(),
        };

        if parts.is_empty() {
            key_name
        } else {
            parts.push(&key_name);
            parts.join("+")
        }
    }
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

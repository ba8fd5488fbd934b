//! Terminal User Interface module.
//!
//! The interactive scanning station, built on ratatui with the crossterm
//! backend.
//!
//! # Overview
//!
//! - [`app`]: display state and mode transitions
//! - [`events`]: terminal input to [`Action`]s
//! - [`keybindings`]: mode-aware key maps
//! - [`ui`]: rendering
//! - [`run`]: terminal setup and the frame loop
//!
//! # Architecture
//!
//! The TUI follows a unidirectional data flow:
//! 1. Events are captured from the terminal (crossterm)
//! 2. Events are translated to Actions
//! 3. Actions modify the App state and yield an [`Effect`]
//! 4. The run loop applies the effect to the station, camera or network
//! 5. The UI renders based on the current App state

pub mod app;
pub mod events;
pub mod keybindings;
pub mod run;
pub mod theme;
pub mod ui;

pub use app::{Action, App, AppMode, Effect};
pub use events::{EventError, EventHandler};
pub use run::{run_tui, Session, TuiError, TuiResult};
pub use theme::Theme;
pub use ui::{preview_value, render};

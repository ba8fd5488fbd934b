//! TUI theming support.
//!
//! Light and dark palettes, plus automatic detection from the terminal
//! environment.

use ratatui::style::Color;

use crate::cli::ThemeArg;

/// A collection of colors used for TUI components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub danger: Color,
    pub success: Color,
    pub dim: Color,
    pub normal: Color,
    pub inverted_fg: Color,
}

impl Theme {
    /// High-contrast dark theme (default).
    ///
    /// Palette:
    /// - Primary: Cyan (headers, borders, busy indicator)
    /// - Secondary: Yellow (last scanned value, warnings)
    /// - Danger: Red (reset prompt, transport errors)
    /// - Success: Green (camera on, accepted submits)
    /// - Dim: DarkGray (hints, disabled commands)
    /// - Normal: White (main text)
    /// - Inverted FG: Black (text on colored background)
    pub fn dark() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Yellow,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::DarkGray,
            normal: Color::White,
            inverted_fg: Color::Black,
        }
    }

    /// High-contrast light theme.
    pub fn light() -> Self {
        Self {
            primary: Color::Blue,
            secondary: Color::Magenta,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::Gray,
            normal: Color::Black,
            inverted_fg: Color::White,
        }
    }

    /// Detect terminal theme or return dark theme as default.
    pub fn auto() -> Self {
        if is_light_terminal() {
            Self::light()
        } else {
            Self::dark()
        }
    }

    /// Resolve the theme chosen on the command line or in the config file.
    pub fn from_arg(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Auto => Self::auto(),
            ThemeArg::Light => Self::light(),
            ThemeArg::Dark => Self::dark(),
        }
    }

    /// Check if this is a light theme.
    pub fn is_light(&self) -> bool {
        self.normal == Color::Black
    }
}

/// Simple heuristic to detect if the terminal is light-themed.
fn is_light_terminal() -> bool {
    // COLORFGBG is "fg;bg" in rxvt, xterm and konsole
    if let Ok(colorfgbg) = std::env::var("COLORFGBG") {
        if let Some(bg) = colorfgbg.split(';').last() {
            if let Ok(bg_num) = bg.parse::<u32>() {
                // 0=black, 7=gray, 8=dark gray, 15=white
                return bg_num >= 7 && bg_num != 8;
            }
        }
    }
    false
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

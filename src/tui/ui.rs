//! TUI layout and rendering with ratatui.
//!
//! # Overview
//!
//! This module renders:
//! - Header with camera and busy status
//! - Endpoint, batch count with a preview of the last value
//! - The most recent entries, newest first
//! - Footer with available commands or the last status message
//! - Modal dialogs for the reset prompt, endpoint editor and submit result
//!
//! # Example
//!
//! ```no_run
//! use qrbatch::tui::app::App;
//! use qrbatch::tui::ui::render;
//! use ratatui::Frame;
//!
//! fn draw(frame: &mut Frame, app: &App) {
//!     render(frame, app);
//! }
//! ```

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::app::{Action, App, AppMode};
use crate::submit::NotificationKind;

/// Characters of the last value shown next to the count.
pub const PREVIEW_CHARS: usize = 20;

fn create_block_with_title<'a>(title: impl Into<Line<'a>>) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .title(title)
}

/// Render the TUI based on current application state.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_content(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);

    match app.mode() {
        AppMode::ConfirmingReset => render_reset_dialog(frame, app, area),
        AppMode::EditingEndpoint => render_endpoint_dialog(frame, app, area),
        AppMode::ShowingResult => render_result_dialog(frame, app, area),
        _ => {}
    }
}

/// Render the header with title and status.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();

    let mut spans = vec![
        Span::styled(
            "qrbatch",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
    ];

    if app.camera_active() {
        spans.push(Span::styled(
            "● CAMERA ON",
            Style::default()
                .fg(theme.success)
                .add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::styled("○ CAMERA OFF", Style::default().fg(theme.dim)));
    }

    if app.is_busy() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "[Sending...]",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        create_block_with_title("").border_style(Style::default().fg(theme.primary)),
    );
    frame.render_widget(header, area);
}

/// Render endpoint, batch summary and recent entries.
fn render_content(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Endpoint
            Constraint::Length(3), // Count
            Constraint::Min(0),    // Recent
        ])
        .split(area);

    let endpoint = Paragraph::new(Span::styled(
        app.endpoint().to_string(),
        Style::default().fg(theme.normal),
    ))
    .block(create_block_with_title("Endpoint").border_style(Style::default().fg(theme.dim)));
    frame.render_widget(endpoint, chunks[0]);

    let snapshot = app.snapshot();
    let mut count_spans = vec![Span::styled(
        format!("Scanned: {}", snapshot.count),
        if app.is_flashing() {
            Style::default()
                .fg(theme.inverted_fg)
                .bg(theme.success)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(theme.normal)
                .add_modifier(Modifier::BOLD)
        },
    )];
    if let Some(last) = &snapshot.last {
        count_spans.push(Span::styled(
            format!(" ({})", preview_value(last.as_str(), PREVIEW_CHARS)),
            Style::default().fg(theme.secondary),
        ));
    }
    let count = Paragraph::new(Line::from(count_spans))
        .block(create_block_with_title("Batch").border_style(Style::default().fg(theme.dim)));
    frame.render_widget(count, chunks[1]);

    let items: Vec<ListItem> = snapshot
        .recent
        .iter()
        .map(|(position, value)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{position}: "), Style::default().fg(theme.dim)),
                Span::styled(value.to_string(), Style::default().fg(theme.normal)),
            ]))
        })
        .collect();
    let recent = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            "No values scanned yet",
            Style::default().fg(theme.dim),
        ))])
    } else {
        List::new(items)
    };
    frame.render_widget(
        recent.block(create_block_with_title("Recent").border_style(Style::default().fg(theme.dim))),
        chunks[2],
    );
}

/// Render the footer with command hints or the status line.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();

    let line = match app.status_message() {
        Some(status) if app.mode() == AppMode::Ready => Line::from(vec![
            Span::styled(status.to_string(), Style::default().fg(theme.secondary)),
            Span::raw("  "),
            Span::styled("[Esc] dismiss", Style::default().fg(theme.dim)),
        ]),
        _ => command_hints(app),
    };

    let footer = Paragraph::new(line)
        .block(create_block_with_title("").border_style(Style::default().fg(theme.dim)));
    frame.render_widget(footer, area);
}

fn command_hints(app: &App) -> Line<'static> {
    let theme = app.theme();
    let mode = app.mode();
    let bindings = app.keybindings();

    let commands: Vec<(Action, &'static str, bool)> = match mode {
        AppMode::Ready => vec![
            (
                Action::ToggleCamera,
                if app.camera_active() { "Stop" } else { "Start" },
                !app.is_busy(),
            ),
            (Action::Submit, "Send", app.can_submit()),
            (Action::Reset, "Reset", app.snapshot().count > 0),
            (Action::EditEndpoint, "Endpoint", true),
            (Action::Quit, "Quit", true),
        ],
        AppMode::ConfirmingReset | AppMode::ShowingResult => vec![
            (Action::Confirm, "OK", true),
            (Action::Cancel, "Close", true),
        ],
        AppMode::EditingEndpoint => {
            return Line::from(Span::styled(
                "[Enter] Save  [Esc] Cancel",
                Style::default().fg(theme.primary),
            ));
        }
        AppMode::Quitting => Vec::new(),
    };

    let mut spans = Vec::new();
    for (action, label, enabled) in commands {
        let style = if enabled {
            Style::default().fg(theme.primary)
        } else {
            Style::default().fg(theme.dim)
        };
        spans.push(Span::styled(
            format!("[{}] {}", bindings.key_hint(action, mode), label),
            style,
        ));
        spans.push(Span::raw("  "));
    }
    spans.pop();
    Line::from(spans)
}

/// Render the reset confirmation prompt.
fn render_reset_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let dialog_area = centered_rect(50, 30, area);
    frame.render_widget(Clear, dialog_area);

    let lines = vec![
        Line::from(Span::styled(
            "Confirm",
            Style::default()
                .fg(theme.danger)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Are you sure you want to delete scanned data?"),
        Line::from(format!("{} value(s) will be discarded.", app.snapshot().count)),
        Line::from(""),
        Line::from(Span::styled(
            "[y] Yes    [n] No",
            Style::default().fg(theme.primary),
        )),
    ];

    let dialog = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(create_block_with_title("Reset").border_style(Style::default().fg(theme.danger)));
    frame.render_widget(dialog, dialog_area);
}

/// Render the endpoint editor.
fn render_endpoint_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let dialog_area = centered_rect(70, 20, area);
    frame.render_widget(Clear, dialog_area);

    let lines = vec![
        Line::from(vec![
            Span::styled(app.edit_buffer().to_string(), Style::default().fg(theme.normal)),
            Span::styled("█", Style::default().fg(theme.primary)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Scanned values are appended as ?qr=<values>",
            Style::default().fg(theme.dim),
        )),
    ];

    let dialog = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(
            create_block_with_title("Edit endpoint")
                .border_style(Style::default().fg(theme.secondary)),
        );
    frame.render_widget(dialog, dialog_area);
}

/// Render the submit result.
fn render_result_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notification) = app.notification() else {
        return;
    };
    let theme = app.theme();
    let dialog_area = centered_rect(60, 40, area);
    frame.render_widget(Clear, dialog_area);

    let color = kind_color(app, notification.kind);
    let mut lines = vec![
        Line::from(Span::styled(
            notification.title.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(notification.message.lines().map(|l| Line::from(l.to_string())));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("{}    [Enter] OK", notification.at.format("%H:%M:%S")),
        Style::default().fg(theme.dim),
    )));

    let dialog = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(create_block_with_title("Result").border_style(Style::default().fg(color)));
    frame.render_widget(dialog, dialog_area);
}

fn kind_color(app: &App, kind: NotificationKind) -> Color {
    let theme = app.theme();
    match kind {
        NotificationKind::Success => theme.success,
        NotificationKind::Warning => theme.secondary,
        NotificationKind::Error => theme.danger,
    }
}

// ==================== Helper Functions ====================

/// Shorten a value to `max_chars` characters, marking the cut with `...`.
///
/// Counts characters, not bytes, so multi-byte payloads are never split.
///
/// # Examples
///
/// ```
/// use qrbatch::tui::ui::preview_value;
///
/// assert_eq!(preview_value("short", 20), "short");
/// assert_eq!(preview_value("abcdefghijklmnopqrstuvwxyz", 20), "abcdefghijklmnopqrst...");
/// ```
#[must_use]
pub fn preview_value(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

/// Create a centered rectangle with given percentage of parent.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

//! Terminal UI rendering for the imagetext TUI.
//!
//! Layout, top to bottom:
//! - title line: server URL and busy indicator
//! - image panel: what is currently displayed and where it came from
//! - general alert, separator, command alert
//! - command history, newest first
//! - status bar: `?` keymap or the active input prompt
//!
//! This module renders from RenderState (immutable snapshot) - it never
//! mutates application state.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::render::RenderState;
use crate::sync::{ErrorSlot, HistoryRow, ImageSource};
use crate::tea::{InputKind, Mode, Notification, NotificationLevel};

// Color tokens (selection uses REVERSED modifier to adapt to terminal theme)
const COLOR_TEXT_DIMMED: Color = Color::Gray;
const COLOR_TEXT_MUTED: Color = Color::DarkGray;
const COLOR_SEPARATOR: Color = Color::White;
const COLOR_ALERT: Color = Color::Yellow;
const COLOR_BUSY: Color = Color::Green;
const COLOR_PREVIEW: Color = Color::Cyan;

// Layout constants
const HEADER_HEIGHT: u16 = 1;
const IMAGE_PANEL_HEIGHT: u16 = 2;
const ALERT_HEIGHT: u16 = 1;

// -----------------------------------------------------------------------------
// Context-sensitive keymap system
// -----------------------------------------------------------------------------

/// Context for determining which keybindings to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeymapContext {
    List {
        has_history: bool,
        can_upload: bool,
        has_alerts: bool,
    },
    TextInput,
    RevertConfirm,
}

impl KeymapContext {
    /// Derive keymap context from render state.
    pub fn from_render_state(state: &RenderState) -> Self {
        match state.mode {
            Mode::Input(InputKind::ConfirmRevert) => KeymapContext::RevertConfirm,
            Mode::Input(_) => KeymapContext::TextInput,
            Mode::List => KeymapContext::List {
                has_history: !state.history.is_empty(),
                can_upload: state.pending_file.is_some(),
                has_alerts: !state.alerts.is_empty(),
            },
        }
    }
}

/// A single keybinding entry for display.
struct Keybinding(&'static str, &'static str);

/// A group of related keybindings (separated by │).
struct KeybindingGroup(Vec<Keybinding>);

fn keybindings_for_context(ctx: KeymapContext) -> Vec<KeybindingGroup> {
    match ctx {
        KeymapContext::List {
            has_history,
            can_upload,
            has_alerts,
        } => {
            let mut edit = vec![Keybinding("c", "command"), Keybinding("u", "undo")];
            if has_history {
                edit.push(Keybinding("r", "revert"));
            }

            let mut file = vec![Keybinding("f", "file")];
            if can_upload {
                file.push(Keybinding("p", "upload"));
            }

            let mut misc = vec![Keybinding("g", "reload")];
            if has_alerts {
                misc.push(Keybinding("x", "dismiss"));
            }
            misc.push(Keybinding("q", "quit"));

            vec![
                KeybindingGroup(edit),
                KeybindingGroup(file),
                KeybindingGroup(misc),
            ]
        }
        KeymapContext::TextInput => vec![KeybindingGroup(vec![
            Keybinding("Enter", "submit"),
            Keybinding("Tab", "switch"),
            Keybinding("Esc", "cancel"),
        ])],
        KeymapContext::RevertConfirm => vec![KeybindingGroup(vec![
            Keybinding("Enter", "revert"),
            Keybinding("Esc", "cancel"),
        ])],
    }
}

/// Main render function - entry point for all UI drawing.
pub fn draw(frame: &mut Frame, state: &RenderState) {
    render_main_layout(frame, state);

    if let Some(ref notification) = state.notification {
        render_notification(frame, notification, frame.area());
    }
}

fn render_main_layout(frame: &mut Frame, state: &RenderState) {
    let area = frame.area();

    if area.height < 8 {
        render_history(frame, state, area);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Length(IMAGE_PANEL_HEIGHT),
        Constraint::Length(ALERT_HEIGHT),
        Constraint::Length(1),
        Constraint::Length(ALERT_HEIGHT),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    frame.render_widget(Paragraph::new(header_line(state)), chunks[0]);
    frame.render_widget(Paragraph::new(image_panel_lines(state)), chunks[1]);
    render_alert(frame, state, ErrorSlot::General, chunks[2]);
    render_separator(frame, chunks[3]);
    render_alert(frame, state, ErrorSlot::Command, chunks[4]);
    render_history(frame, state, chunks[5]);
    render_statusbar(frame, state, chunks[6]);
}

fn header_line(state: &RenderState) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            "imagetext",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ", Style::default()),
        Span::styled(
            state.server_url.clone(),
            Style::default().fg(COLOR_TEXT_DIMMED),
        ),
    ];
    if state.busy {
        spans.push(Span::styled("  working…", Style::default().fg(COLOR_BUSY)));
    }
    Line::from(spans)
}

fn image_panel_lines(state: &RenderState) -> Vec<Line<'static>> {
    let image_line = match &state.image {
        Some(view) => {
            let color = if view.source == ImageSource::LocalPreview {
                COLOR_PREVIEW
            } else {
                Color::Reset
            };
            Line::from(vec![
                Span::styled("Image: ", Style::default().fg(COLOR_TEXT_DIMMED)),
                Span::styled(view.describe(), Style::default().fg(color)),
            ])
        }
        None => Line::from(Span::styled(
            "No image. Press 'f' to pick a file.",
            Style::default().fg(COLOR_TEXT_DIMMED),
        )),
    };

    let pending_line = match &state.pending_file {
        Some(name) => Line::from(vec![
            Span::styled("Pending: ", Style::default().fg(COLOR_TEXT_DIMMED)),
            Span::styled(name.clone(), Style::default()),
            Span::styled(" (p to upload)", Style::default().fg(COLOR_TEXT_MUTED)),
        ]),
        None => Line::default(),
    };

    vec![image_line, pending_line]
}

fn render_alert(frame: &mut Frame, state: &RenderState, slot: ErrorSlot, area: Rect) {
    let Some(message) = state.alert(slot) else {
        return;
    };
    let line = Line::from(vec![
        Span::styled(
            format!("! {} ", slot.label()),
            Style::default()
                .fg(COLOR_ALERT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            truncate(message, area.width as usize),
            Style::default().fg(COLOR_ALERT),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the separator - solid divider line between the document and its history.
fn render_separator(frame: &mut Frame, area: Rect) {
    let solid = "─".repeat(area.width as usize);
    let line = Line::from(Span::styled(solid, Style::default().fg(COLOR_SEPARATOR)));
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the history with scrolloff navigation.
fn render_history(frame: &mut Frame, state: &RenderState, area: Rect) {
    if state.history.is_empty() {
        let msg = Line::from(Span::styled(
            "No commands yet. Press 'c' to type one.",
            Style::default().fg(COLOR_TEXT_DIMMED),
        ));
        frame.render_widget(Paragraph::new(msg), area);
        return;
    }

    let (start, end) = visible_window(state.selected, state.history.len(), area.height as usize);
    let lines: Vec<Line> = state.history[start..end]
        .iter()
        .enumerate()
        .map(|(offset, row)| history_line(row, start + offset == state.selected, area.width))
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

/// Rows `[start, end)` to draw so the selection stays centered.
fn visible_window(selected: usize, total: usize, height: usize) -> (usize, usize) {
    let center = height / 2;
    let start = selected.saturating_sub(center);
    let end = (start + height).min(total);
    let start = end.saturating_sub(height);
    (start, end)
}

fn history_line(row: &HistoryRow, is_selected: bool, width: u16) -> Line<'static> {
    let text = truncate(&row.to_string(), width as usize);
    let style = if is_selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    Line::from(Span::styled(text, style))
}

/// Render the status bar - keymap or input prompt.
fn render_statusbar(frame: &mut Frame, state: &RenderState, area: Rect) {
    let line = match state.mode {
        Mode::Input(kind) => render_input_line(state, kind),
        Mode::List => render_keymap_line(state),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Render keybindings legend for the bottom line.
/// When show_keymap is false: Shows just "?" (grayed out)
/// When show_keymap is true: Shows "? │ <full keymap legend>" with bright "?"
fn render_keymap_line(state: &RenderState) -> Line<'static> {
    let ctx = KeymapContext::from_render_state(state);
    let groups = keybindings_for_context(ctx);

    let key_style = Style::default().fg(COLOR_TEXT_DIMMED);
    let desc_style = Style::default().fg(COLOR_TEXT_MUTED);
    let sep_style = Style::default().fg(COLOR_TEXT_MUTED);

    let help_style = if state.show_keymap {
        Style::default()
    } else {
        Style::default().fg(COLOR_TEXT_MUTED)
    };
    let mut spans: Vec<Span> = vec![Span::styled("?", help_style)];

    if state.show_keymap {
        for group in groups.iter().filter(|g| !g.0.is_empty()) {
            spans.push(Span::styled(" │ ", sep_style));
            for (key_idx, keybinding) in group.0.iter().enumerate() {
                if key_idx > 0 {
                    spans.push(Span::styled(" • ", sep_style));
                }
                spans.push(Span::styled(keybinding.0, key_style));
                spans.push(Span::styled(format!(" {}", keybinding.1), desc_style));
            }
        }
    }

    Line::from(spans)
}

/// Render input prompt for the bottom line (replaces keymap when in input mode).
fn render_input_line(state: &RenderState, kind: InputKind) -> Line<'static> {
    let hint_style = Style::default().fg(COLOR_TEXT_MUTED);
    let label_style = Style::default().fg(Color::Reset);
    let input_style = Style::default().fg(Color::White);
    let cursor_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::SLOW_BLINK);

    let label = kind.label();

    if kind == InputKind::ConfirmRevert {
        let target = state
            .history
            .get(state.selected)
            .map(|row| format!(" keep {} command(s)", row.index))
            .unwrap_or_default();
        return Line::from(vec![
            Span::styled("Enter • Esc  ", hint_style),
            Span::styled(format!("{label}{target}"), label_style),
        ]);
    }

    Line::from(vec![
        Span::styled("Enter • Tab • Esc  ", hint_style),
        Span::styled(format!("{label}: "), label_style),
        Span::styled(state.input_buffer.clone(), input_style),
        Span::styled("_", cursor_style),
    ])
}

/// Render notification message on the bottom line of the screen.
///
/// - Error: Red text with "Error:" prefix and bold styling
/// - Info: Green text without prefix
fn render_notification(frame: &mut Frame, notification: &Notification, area: Rect) {
    let notification_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    frame.render_widget(Clear, notification_area);

    let line = match notification.level {
        NotificationLevel::Error => Line::from(vec![
            Span::styled(
                "Error: ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                notification.message.clone(),
                Style::default().fg(Color::Red),
            ),
        ]),
        NotificationLevel::Info => Line::from(Span::styled(
            notification.message.clone(),
            Style::default().fg(Color::Green),
        )),
    };

    frame.render_widget(Paragraph::new(line), notification_area);
}

// Helper functions

fn truncate(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 1).collect();
        format!("{}~", truncated)
    }
}

//! Model for the TEA (The Elm Architecture) pattern.
//!
//! The Model is pure application state - no channels, no handles, no runtime infrastructure.
//! Document state lives in the embedded [`SyncController`]; everything else here is
//! presentation state for the terminal UI.

use crate::config::Config;
use crate::render::{next_version, AlertView, ImageView, RenderState};
use crate::sync::{HistoryRow, SyncController};

/// Level of a notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Error notification - displayed in red with "Error:" prefix
    Error,
    /// Informational notification - displayed in green
    Info,
}

/// A transient local diagnostic, cleared on the next key press.
///
/// Server-reported errors are not notifications; they are alerts derived
/// from the document's error state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Application UI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    List,
    Input(InputKind),
}

/// Types of input prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Command,
    FilePath,
    ConfirmRevert,
}

impl InputKind {
    pub fn label(&self) -> &'static str {
        match self {
            InputKind::Command => "Command",
            InputKind::FilePath => "File",
            InputKind::ConfirmRevert => "Revert?",
        }
    }

    /// Cycle between the two text prompts (Tab behavior).
    /// Returns None for ConfirmRevert since it doesn't cycle.
    pub fn next(&self) -> Option<InputKind> {
        match self {
            InputKind::Command => Some(InputKind::FilePath),
            InputKind::FilePath => Some(InputKind::Command),
            InputKind::ConfirmRevert => None,
        }
    }
}

pub struct Model {
    pub sync: SyncController,

    // Presentation state
    /// Selected row in the newest-first history list.
    pub selected: usize,
    pub mode: Mode,
    pub input_buffer: String,
    pub command_draft: String,
    pub path_draft: String,
    pub notification: Option<Notification>,
    /// Chronological index awaiting confirmation.
    pub pending_revert: Option<usize>,
    /// Alerts hidden by the user until the next applied snapshot.
    pub alerts_dismissed: bool,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,

    // Dirty flag - set when state changes and render is needed
    pub dirty: bool,

    // Config (immutable after init)
    pub config: Config,
}

impl Model {
    pub fn new(config: Config) -> Self {
        Self {
            sync: SyncController::new(),
            selected: 0,
            mode: Mode::default(),
            input_buffer: String::new(),
            command_draft: String::new(),
            path_draft: String::new(),
            notification: None,
            pending_revert: None,
            alerts_dismissed: false,
            show_keymap: false,
            dirty: true,
            config,
        }
    }

    pub fn history_len(&self) -> usize {
        self.sync.state().commands().len()
    }

    /// The history row under the cursor.
    pub fn selected_row(&self) -> Option<HistoryRow> {
        self.sync.state().commands().display_rows().nth(self.selected)
    }

    /// Keep the cursor on an existing row after the history is replaced.
    pub fn clamp_selection(&mut self) {
        let len = self.history_len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Create an immutable snapshot for the render thread.
    pub fn snapshot(&self) -> RenderState {
        let state = self.sync.state();
        let alerts = if self.alerts_dismissed {
            Vec::new()
        } else {
            state
                .errors()
                .iter()
                .map(|(slot, message)| AlertView {
                    slot,
                    message: message.to_string(),
                })
                .collect()
        };

        RenderState {
            version: next_version(),
            server_url: self.config.effective_server_url().to_string(),
            image: ImageView::from_state(state.image()),
            pending_file: self.sync.pending_file().map(|f| f.name.clone()),
            history: state.commands().display_rows().collect(),
            selected: self.selected,
            mode: self.mode,
            input_buffer: self.input_buffer.clone(),
            notification: self.notification.clone(),
            alerts,
            busy: self.sync.is_busy(),
            show_keymap: self.show_keymap,
        }
    }
}

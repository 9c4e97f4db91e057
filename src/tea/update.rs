//! Pure update function for the TEA (The Elm Architecture) pattern.
//!
//! The update function takes a model and a message, mutates the model,
//! and returns a list of commands to execute.

use crossterm::event::{KeyCode, KeyEvent};

use crate::sync::Resolution;
use crate::{ilog_debug, ilog_warn, Error};

use super::command::Command;
use super::message::Message;
use super::model::{InputKind, Mode, Model, Notification, NotificationLevel};

/// Helper to set an error notification and mark model as dirty.
fn set_error(model: &mut Model, message: String) {
    ilog_warn!("UI Error: {}", message);
    model.notification = Some(Notification {
        level: NotificationLevel::Error,
        message,
    });
    model.dirty = true;
}

fn set_info(model: &mut Model, message: String) {
    model.notification = Some(Notification {
        level: NotificationLevel::Info,
        message,
    });
    model.dirty = true;
}

/// Show a local rejection without the error-type prefix.
fn reject(model: &mut Model, err: Error) {
    let message = match err {
        Error::Validation(msg) => msg,
        other => other.to_string(),
    };
    set_error(model, message);
}

/// Pure update function: Model + Message → Commands
///
/// All I/O happens via the returned Commands; their results come back as
/// messages.
pub fn update(model: &mut Model, msg: Message) -> Vec<Command> {
    let mut cmds = Vec::new();

    match msg {
        Message::Key(key) => {
            model.notification = None; // Clear notification on any key press
            model.dirty = true; // Keyboard input always triggers render
            match model.mode {
                Mode::List => update_list_mode(model, key, &mut cmds),
                Mode::Input(kind) => update_input_mode(model, key, kind, &mut cmds),
            }
        }

        Message::Resize(_, _) => {
            model.dirty = true; // Resize triggers re-render
        }

        Message::Mounted => {
            cmds.push(Command::Dispatch(model.sync.on_mount()));
            model.dirty = true;
        }

        Message::SnapshotReceived { seq, snapshot } => {
            if model.sync.resolve(seq, snapshot) == Resolution::Applied {
                model.alerts_dismissed = false;
                model.clamp_selection();
            }
            // Busy indicator changes either way.
            model.dirty = true;
        }

        Message::RequestFailed { seq, error } => {
            let latest = seq == model.sync.latest_seq();
            model.sync.fail(seq, &error);
            if latest {
                set_error(model, format!("Request failed: {}", error));
            } else {
                ilog_debug!("Message::RequestFailed superseded seq={}", seq);
            }
            model.dirty = true;
        }

        Message::PreviewReady {
            generation,
            data_uri,
        } => {
            if model.sync.show_preview(generation, data_uri) {
                model.dirty = true;
            }
        }

        Message::PreviewFailed { generation, error } => {
            ilog_debug!("Message::PreviewFailed generation={}", generation);
            set_error(model, format!("Cannot preview file: {}", error));
        }
    }

    cmds
}

fn update_list_mode(model: &mut Model, key: KeyEvent, cmds: &mut Vec<Command>) {
    let rows = model.history_len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if rows > 0 {
                model.selected = (model.selected + 1) % rows;
            }
        }

        KeyCode::Char('k') | KeyCode::Up => {
            if rows > 0 {
                model.selected = model.selected.checked_sub(1).unwrap_or(rows - 1);
            }
        }

        KeyCode::Char('c') | KeyCode::Enter => {
            model.mode = Mode::Input(InputKind::Command);
            model.input_buffer = model.command_draft.clone();
        }

        KeyCode::Char('f') => {
            model.mode = Mode::Input(InputKind::FilePath);
            model.input_buffer = model.path_draft.clone();
        }

        KeyCode::Char('p') => match model.sync.on_upload_requested() {
            Ok(dispatch) => cmds.push(Command::Dispatch(dispatch)),
            Err(e) => reject(model, e),
        },

        KeyCode::Char('u') => {
            cmds.push(Command::Dispatch(model.sync.on_undo_requested()));
        }

        KeyCode::Char('r') => match model.selected_row() {
            Some(row) => {
                model.pending_revert = Some(row.index);
                model.mode = Mode::Input(InputKind::ConfirmRevert);
                model.input_buffer.clear();
            }
            None => set_error(model, "History is empty".to_string()),
        },

        KeyCode::Char('g') => {
            cmds.push(Command::Dispatch(model.sync.on_mount()));
        }

        KeyCode::Char('x') => {
            model.alerts_dismissed = true;
        }

        KeyCode::Char('q') | KeyCode::Esc => {
            cmds.push(Command::Quit);
        }

        KeyCode::Char('?') => {
            model.show_keymap = !model.show_keymap;
        }

        _ => {}
    }
}

fn update_input_mode(model: &mut Model, key: KeyEvent, kind: InputKind, cmds: &mut Vec<Command>) {
    match key.code {
        KeyCode::Enter => submit_input(model, kind, cmds),

        KeyCode::Tab => {
            // Switch prompts, keeping each one's draft
            if let Some(next_kind) = kind.next() {
                store_draft(model, kind);
                model.mode = Mode::Input(next_kind);
                load_draft(model, next_kind);
            }
        }

        KeyCode::Esc => {
            store_draft(model, kind);
            model.input_buffer.clear();
            model.pending_revert = None;
            model.mode = Mode::List;
        }

        KeyCode::Backspace => {
            model.input_buffer.pop();
        }

        KeyCode::Char(c) if kind != InputKind::ConfirmRevert => {
            model.input_buffer.push(c);
        }

        _ => {}
    }
}

fn submit_input(model: &mut Model, kind: InputKind, cmds: &mut Vec<Command>) {
    match kind {
        InputKind::Command => match model.sync.on_command_submitted(&model.input_buffer) {
            Ok(dispatch) => {
                // Cleared as soon as the request is issued, not when it's confirmed
                model.input_buffer.clear();
                model.command_draft.clear();
                model.mode = Mode::List;
                cmds.push(Command::Dispatch(dispatch));
            }
            Err(e) => reject(model, e),
        },

        InputKind::FilePath => match model.sync.on_file_selected(&model.input_buffer) {
            Ok(ticket) => {
                let name = model
                    .sync
                    .pending_file()
                    .map(|f| f.name.clone())
                    .unwrap_or_default();
                model.input_buffer.clear();
                model.path_draft.clear();
                model.mode = Mode::List;
                cmds.push(Command::EncodePreview(ticket));
                set_info(model, format!("Selected {}. Press p to upload.", name));
            }
            Err(e) => reject(model, e),
        },

        InputKind::ConfirmRevert => {
            model.mode = Mode::List;
            if let Some(index) = model.pending_revert.take() {
                match model.sync.on_revert_requested(index) {
                    Ok(dispatch) => cmds.push(Command::Dispatch(dispatch)),
                    Err(e) => reject(model, e),
                }
            }
        }
    }
}

fn store_draft(model: &mut Model, kind: InputKind) {
    let value = std::mem::take(&mut model.input_buffer);
    match kind {
        InputKind::Command => model.command_draft = value,
        InputKind::FilePath => model.path_draft = value,
        InputKind::ConfirmRevert => {}
    }
}

fn load_draft(model: &mut Model, kind: InputKind) {
    model.input_buffer = match kind {
        InputKind::Command => model.command_draft.clone(),
        InputKind::FilePath => model.path_draft.clone(),
        InputKind::ConfirmRevert => String::new(),
    };
}

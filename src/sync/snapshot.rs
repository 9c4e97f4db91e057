//! Server snapshots: the full-state payload returned by every backend call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::image::png_data_uri;
use crate::{ilog_debug, Result};

/// Which alert a server-reported error belongs to.
///
/// On the wire errors are positional: index 0 is the general/upload error,
/// index 1 the command-specific one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSlot {
    General,
    Command,
}

impl ErrorSlot {
    pub const ALL: [ErrorSlot; 2] = [ErrorSlot::General, ErrorSlot::Command];

    fn from_wire_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ErrorSlot::General),
            1 => Some(ErrorSlot::Command),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ErrorSlot::General => "general",
            ErrorSlot::Command => "command",
        }
    }
}

/// Server-reported errors from the most recently applied exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ErrorState {
    #[serde(skip_serializing_if = "Option::is_none")]
    general: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<String>,
}

impl ErrorState {
    /// Build from the raw `errors` array, dropping falsy entries first.
    pub fn from_wire(values: Vec<Value>) -> Self {
        let mut state = Self::default();
        let messages = values.into_iter().filter_map(truthy_message);
        for (index, message) in messages.enumerate() {
            match ErrorSlot::from_wire_index(index) {
                Some(slot) => state = state.with(slot, message),
                None => ilog_debug!("ErrorState: ignoring extra server error {:?}", message),
            }
        }
        state
    }

    pub fn with(mut self, slot: ErrorSlot, message: impl Into<String>) -> Self {
        let message = Some(message.into());
        match slot {
            ErrorSlot::General => self.general = message,
            ErrorSlot::Command => self.command = message,
        }
        self
    }

    pub fn get(&self, slot: ErrorSlot) -> Option<&str> {
        match slot {
            ErrorSlot::General => self.general.as_deref(),
            ErrorSlot::Command => self.command.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.general.is_none() && self.command.is_none()
    }

    /// Populated slots, general first.
    pub fn iter(&self) -> impl Iterator<Item = (ErrorSlot, &str)> {
        ErrorSlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|msg| (slot, msg)))
    }
}

/// Mirrors JavaScript truthiness, which is what the backend's clients expect.
fn truthy_message(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// A complete state replacement as confirmed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Snapshot {
    /// Displayable data URI, `None` when the response carried no image.
    pub image: Option<String>,
    pub commands: Vec<String>,
    pub errors: ErrorState,
}

#[derive(Debug, Deserialize)]
struct WireSnapshot {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    commands: Option<Vec<String>>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

impl Snapshot {
    /// Parse a backend response body.
    pub fn from_body(body: &str) -> Result<Self> {
        let wire: WireSnapshot = serde_json::from_str(body)?;
        Ok(wire.into())
    }
}

impl From<WireSnapshot> for Snapshot {
    fn from(wire: WireSnapshot) -> Self {
        Self {
            image: wire
                .image
                .filter(|image| !image.is_empty())
                .map(|image| png_data_uri(&image)),
            commands: wire.commands.unwrap_or_default(),
            errors: ErrorState::from_wire(wire.errors.unwrap_or_default()),
        }
    }
}

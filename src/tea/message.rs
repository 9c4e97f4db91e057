//! Messages for the TEA (The Elm Architecture) pattern.
//!
//! Messages are inputs to the update function - they come from external sources
//! like keyboard events or completion callbacks of spawned requests.

use crossterm::event::KeyEvent;

use crate::sync::Snapshot;

/// Input messages to the update function.
#[derive(Debug)]
pub enum Message {
    // Keyboard/terminal events
    Key(KeyEvent),
    Resize(u16, u16),

    /// UI is up; seed state from the server.
    Mounted,

    // Request completion callbacks
    SnapshotReceived {
        seq: u64,
        snapshot: Snapshot,
    },
    RequestFailed {
        seq: u64,
        error: String,
    },

    // Local preview completion callbacks
    PreviewReady {
        generation: u64,
        data_uri: String,
    },
    PreviewFailed {
        generation: u64,
        error: String,
    },
}

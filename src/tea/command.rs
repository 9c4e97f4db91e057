//! Commands for the TEA (The Elm Architecture) pattern.
//!
//! Commands are outputs from the update function - they represent side effects
//! to be executed by the runtime.

use crate::sync::{Dispatch, PreviewTicket};

/// Output commands from the update function.
#[derive(Debug)]
pub enum Command {
    /// Run a tagged request through the gateway.
    Dispatch(Dispatch),
    /// Encode a newly selected file for preview.
    EncodePreview(PreviewTicket),

    // App lifecycle
    Quit,
}

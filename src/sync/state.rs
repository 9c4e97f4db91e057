//! The client's view of the document: image, command history and errors.

use super::history::CommandLog;
use super::image::ImageState;
use super::snapshot::{ErrorState, Snapshot};

/// The last confirmed server snapshot, plus at most one local preview.
///
/// `apply` is the only writer of all three fields; `show_preview` may
/// overwrite the image slot alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentState {
    image: ImageState,
    commands: CommandLog,
    errors: ErrorState,
    /// Number of snapshots applied so far.
    revision: u64,
}

impl DocumentState {
    pub fn image(&self) -> &ImageState {
        &self.image
    }

    pub fn commands(&self) -> &CommandLog {
        &self.commands
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace image, commands and errors together from one server answer.
    pub(crate) fn apply(&mut self, snapshot: Snapshot) {
        self.image = match snapshot.image {
            Some(uri) => ImageState::Confirmed(uri),
            None => ImageState::Absent,
        };
        self.commands.replace(snapshot.commands);
        self.errors = snapshot.errors;
        self.revision += 1;
    }

    pub(crate) fn show_preview(&mut self, data_uri: String, generation: u64) {
        self.image = ImageState::Preview {
            data_uri,
            generation,
        };
    }
}

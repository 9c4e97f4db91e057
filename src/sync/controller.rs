//! Decides when a backend round trip is warranted and which answers count.
//!
//! Every request gets a sequence number when it is issued. Because each
//! response is a full-state replacement, only the answer to the most recently
//! issued request is applied; earlier answers arriving later are discarded.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::gateway::{Operation, Request};
use super::preview::{PendingFile, PreviewTicket};
use super::snapshot::Snapshot;
use super::state::DocumentState;
use crate::{ilog, ilog_debug, ilog_warn, Error, Result};

/// A request the runtime must hand to the gateway, tagged for ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub seq: u64,
    pub request: Request,
}

/// What happened to a response once it came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Latest request: state replaced from the snapshot.
    Applied,
    /// Superseded by a newer request: discarded.
    Stale,
    /// Transport failure: state untouched.
    Failed,
}

#[derive(Debug, Default)]
pub struct SyncController {
    state: DocumentState,
    pending: Option<PendingFile>,
    next_generation: u64,
    /// Newest file selection the server has accepted.
    uploaded_generation: Option<u64>,
    /// Sequence of the most recently issued request; 0 before the first.
    latest_seq: u64,
    in_flight: BTreeMap<u64, Request>,
}

impl SyncController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn pending_file(&self) -> Option<&PendingFile> {
        self.pending.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    fn issue(&mut self, request: Request) -> Dispatch {
        self.latest_seq += 1;
        let seq = self.latest_seq;
        ilog_debug!("SyncController: issue seq={} request={}", seq, request.name());
        self.in_flight.insert(seq, request.clone());
        Dispatch { seq, request }
    }

    /// Initial load of server state.
    pub fn on_mount(&mut self) -> Dispatch {
        self.issue(Request::Load)
    }

    /// Remember `path` as the file to upload and ask for its preview.
    pub fn on_file_selected(&mut self, path: &str) -> Result<PreviewTicket> {
        let path = path.trim();
        if path.is_empty() {
            return Err(reject("no file selected"));
        }
        self.next_generation += 1;
        let file = PendingFile::new(PathBuf::from(path), self.next_generation);
        ilog_debug!(
            "SyncController: pending file {} generation={}",
            file.name,
            file.generation
        );
        let ticket = PreviewTicket {
            generation: file.generation,
            path: file.path.clone(),
        };
        self.pending = Some(file);
        Ok(ticket)
    }

    pub fn on_upload_requested(&mut self) -> Result<Dispatch> {
        let Some(file) = self.pending.clone() else {
            return Err(reject("nothing to upload, select a file first"));
        };
        Ok(self.issue(Request::Mutate(Operation::UploadImage(file))))
    }

    /// Send `text` as a new command. The caller clears its input once this succeeds.
    pub fn on_command_submitted(&mut self, text: &str) -> Result<Dispatch> {
        let text = text.trim();
        if text.is_empty() {
            return Err(reject("command is empty"));
        }
        Ok(self.issue(Request::Mutate(Operation::AppendCommand(text.to_string()))))
    }

    /// Always sent: only the server knows whether there is anything to undo.
    pub fn on_undo_requested(&mut self) -> Dispatch {
        self.issue(Request::Mutate(Operation::Undo))
    }

    /// Roll history back so that `index` commands remain.
    pub fn on_revert_requested(&mut self, index: usize) -> Result<Dispatch> {
        let commands = self.state.commands();
        if !commands.accepts_revert(index) {
            return Err(reject(&format!(
                "revert index {} is out of range (history has {} commands)",
                index,
                commands.len()
            )));
        }
        Ok(self.issue(Request::Mutate(Operation::RevertTo(index))))
    }

    /// Revert at a newest-first history row.
    pub fn on_revert_row_requested(&mut self, display_pos: usize) -> Result<Dispatch> {
        let index = self
            .state
            .commands()
            .chronological_index(display_pos)
            .ok_or_else(|| reject(&format!("no history row {}", display_pos)))?;
        self.on_revert_requested(index)
    }

    /// Apply the server's answer to request `seq`, unless a newer request exists.
    pub fn resolve(&mut self, seq: u64, snapshot: Snapshot) -> Resolution {
        if let Some(Request::Mutate(Operation::UploadImage(file))) = self.in_flight.remove(&seq) {
            self.upload_accepted(file.generation);
        }

        if seq != self.latest_seq {
            ilog_debug!(
                "SyncController: discard stale seq={} latest={}",
                seq,
                self.latest_seq
            );
            return Resolution::Stale;
        }

        self.state.apply(snapshot);
        ilog!(
            "Snapshot applied: seq={} commands={} errors={}",
            seq,
            self.state.commands().len(),
            self.state.errors().iter().count()
        );
        Resolution::Applied
    }

    /// Record a transport failure for request `seq`.
    pub fn fail(&mut self, seq: u64, error: &str) -> Resolution {
        let name = self
            .in_flight
            .remove(&seq)
            .map(|r| r.name())
            .unwrap_or("unknown");
        ilog_warn!("Request failed: seq={} request={} error={}", seq, name, error);
        Resolution::Failed
    }

    /// Show a finished local preview, if it still describes the pending file.
    pub fn show_preview(&mut self, generation: u64, data_uri: String) -> bool {
        let current = self.pending.as_ref().map(|f| f.generation) == Some(generation);
        let uploaded = self.uploaded_generation.is_some_and(|g| g >= generation);
        if !current || uploaded {
            ilog_debug!(
                "SyncController: drop preview generation={} current={} uploaded={}",
                generation,
                current,
                uploaded
            );
            return false;
        }
        self.state.show_preview(data_uri, generation);
        true
    }

    fn upload_accepted(&mut self, generation: u64) {
        let newest = self
            .uploaded_generation
            .map_or(generation, |g| g.max(generation));
        self.uploaded_generation = Some(newest);
        if self.pending.as_ref().map(|f| f.generation) == Some(generation) {
            self.pending = None;
        }
    }
}

fn reject(message: &str) -> Error {
    ilog_warn!("Rejected locally: {}", message);
    Error::Validation(message.to_string())
}

//! Command-history synchronization with the transformation backend.
//!
//! - `gateway`: the only code that talks to the server
//! - `controller`: validation and sequence-guarded application of replies
//! - `state`: image + command log + server errors, replaced as one unit
//! - `preview`: local files pending upload and their previews
//! - `client`: a sequential driver for headless commands

pub mod client;
pub mod controller;
pub mod gateway;
pub mod history;
pub mod image;
pub mod preview;
pub mod snapshot;
pub mod state;

pub use client::SyncClient;
pub use controller::{Dispatch, Resolution, SyncController};
pub use gateway::{HttpTransport, Operation, PostField, Request, RequestGateway, Transport};
pub use history::{CommandLog, HistoryRow};
pub use image::{DataUri, ImageSource, ImageState};
pub use preview::{LocalPreviewEncoder, PendingFile, PreviewTicket};
pub use snapshot::{ErrorSlot, ErrorState, Snapshot};
pub use state::DocumentState;

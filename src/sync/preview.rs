//! Local files awaiting upload, and their instant previews.

use std::path::{Path, PathBuf};

use super::image::encode_data_uri;
use crate::util::blocking;
use crate::{ilog_debug, Result};

const FALLBACK_MIME: &str = "application/octet-stream";

/// MIME type guessed from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("svg") => "image/svg+xml",
        _ => FALLBACK_MIME,
    }
}

/// A file chosen by the user but not yet accepted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub path: PathBuf,
    pub name: String,
    /// Increases with every selection; ties previews and uploads to it.
    pub generation: u64,
}

impl PendingFile {
    pub fn new(path: PathBuf, generation: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            generation,
        }
    }

    pub fn mime(&self) -> &'static str {
        mime_for_path(&self.path)
    }
}

/// Request to render a preview for one file selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTicket {
    pub generation: u64,
    pub path: PathBuf,
}

/// Reads a local file into a data URI for display before upload.
pub struct LocalPreviewEncoder;

impl LocalPreviewEncoder {
    pub async fn encode(path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        let mime = mime_for_path(path);
        ilog_debug!(
            "LocalPreviewEncoder::encode path={} bytes={} mime={}",
            path.display(),
            bytes.len(),
            mime
        );
        blocking(move || Ok(encode_data_uri(mime, &bytes))).await
    }
}

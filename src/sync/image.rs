//! The displayed image slot and the data URIs that fill it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::{Error, Result};

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
// 24 decoded bytes: signature, IHDR length + tag, width, height.
const PNG_HEADER_B64_CHARS: usize = 32;

/// Wrap the backend's bare base64 PNG payload into a displayable data URI.
pub fn png_data_uri(base64_png: &str) -> String {
    format!("{DATA_PREFIX}image/png{BASE64_MARKER}{base64_png}")
}

/// Encode raw file bytes as a data URI with the given MIME type.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("{DATA_PREFIX}{mime}{BASE64_MARKER}{}", STANDARD.encode(bytes))
}

/// A borrowed view of a `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> Result<Self> {
        let rest = uri
            .strip_prefix(DATA_PREFIX)
            .ok_or_else(|| Error::InvalidDataUri("missing data: prefix".to_string()))?;
        let (mime, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| Error::InvalidDataUri("not base64 encoded".to_string()))?;
        Ok(Self { mime, payload })
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(STANDARD.decode(self.payload.trim())?)
    }

    /// Decoded size computed from the payload length, without decoding.
    pub fn decoded_len(&self) -> usize {
        let payload = self.payload.trim();
        let padding = payload.bytes().rev().take_while(|b| *b == b'=').count();
        (payload.len() * 3 / 4).saturating_sub(padding)
    }

    /// Width and height from the PNG IHDR chunk, if this is a PNG.
    pub fn png_dimensions(&self) -> Option<(u32, u32)> {
        let head = self.payload.get(..PNG_HEADER_B64_CHARS)?;
        let bytes = STANDARD.decode(head).ok()?;
        if bytes.get(..8)? != PNG_SIGNATURE || bytes.get(12..16)? != b"IHDR" {
            return None;
        }
        let width = u32::from_be_bytes(bytes.get(16..20)?.try_into().ok()?);
        let height = u32::from_be_bytes(bytes.get(20..24)?.try_into().ok()?);
        Some((width, height))
    }
}

/// Where the currently displayed image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Server,
    LocalPreview,
}

impl ImageSource {
    pub fn label(&self) -> &'static str {
        match self {
            ImageSource::Server => "server",
            ImageSource::LocalPreview => "local preview",
        }
    }
}

/// The single image slot shared by server snapshots and local previews.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageState {
    #[default]
    Absent,
    Confirmed(String),
    Preview {
        data_uri: String,
        generation: u64,
    },
}

impl ImageState {
    pub fn data_uri(&self) -> Option<&str> {
        match self {
            ImageState::Absent => None,
            ImageState::Confirmed(uri) => Some(uri),
            ImageState::Preview { data_uri, .. } => Some(data_uri),
        }
    }

    pub fn source(&self) -> Option<ImageSource> {
        match self {
            ImageState::Absent => None,
            ImageState::Confirmed(_) => Some(ImageSource::Server),
            ImageState::Preview { .. } => Some(ImageSource::LocalPreview),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ImageState::Absent)
    }
}

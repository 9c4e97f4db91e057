use crate::sync::{DataUri, ErrorSlot, HistoryRow, ImageSource, ImageState};
use crate::tea::{Mode, Notification};
use std::sync::atomic::{AtomicU64, Ordering};

/// What the terminal can say about the displayed image.
///
/// The image itself is never drawn; the panel describes it instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    pub source: ImageSource,
    /// MIME type from the data URI, or "unknown" if it isn't one.
    pub mime: String,
    /// Decoded size in bytes.
    pub bytes: usize,
    pub dimensions: Option<(u32, u32)>,
}

impl ImageView {
    pub fn from_state(image: &ImageState) -> Option<Self> {
        let source = image.source()?;
        let uri = image.data_uri()?;
        let view = match DataUri::parse(uri) {
            Ok(data) => Self {
                source,
                mime: data.mime.to_string(),
                bytes: data.decoded_len(),
                dimensions: data.png_dimensions(),
            },
            Err(_) => Self {
                source,
                mime: "unknown".to_string(),
                bytes: 0,
                dimensions: None,
            },
        };
        Some(view)
    }

    /// One-line summary, e.g. `image/png 640x480 12.3 KiB (server)`.
    pub fn describe(&self) -> String {
        let mut parts = vec![self.mime.clone()];
        if let Some((w, h)) = self.dimensions {
            parts.push(format!("{}x{}", w, h));
        }
        parts.push(format_bytes(self.bytes));
        format!("{} ({})", parts.join(" "), self.source.label())
    }
}

/// A server-reported error, ready to be shown in its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertView {
    pub slot: ErrorSlot,
    pub message: String,
}

pub fn format_bytes(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{} B", bytes)
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}

static VERSION_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn next_version() -> u64 {
    VERSION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub struct RenderState {
    pub version: u64,
    pub server_url: String,
    pub image: Option<ImageView>,
    /// Name of the selected file still waiting to be uploaded.
    pub pending_file: Option<String>,
    /// Newest first.
    pub history: Vec<HistoryRow>,
    pub selected: usize,
    pub mode: Mode,
    pub input_buffer: String,
    pub notification: Option<Notification>,
    pub alerts: Vec<AlertView>,
    /// A request is in flight.
    pub busy: bool,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,
}

impl RenderState {
    pub fn alert(&self, slot: ErrorSlot) -> Option<&str> {
        self.alerts
            .iter()
            .find(|a| a.slot == slot)
            .map(|a| a.message.as_str())
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            version: 0,
            server_url: String::new(),
            image: None,
            pending_file: None,
            history: Vec::new(),
            selected: 0,
            mode: Mode::List,
            input_buffer: String::new(),
            notification: None,
            alerts: Vec::new(),
            busy: false,
            show_keymap: false,
        }
    }
}

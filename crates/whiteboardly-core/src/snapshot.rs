//! Immutable bitmap snapshots of the drawing surface.
//!
//! History keeps snapshots as raw premultiplied RGBA so that restoring one is
//! bit-exact. The PNG data URL form is only produced at the persistence
//! boundary, where the host needs a portable serialized surface.

use crate::error::{EngineError, EngineResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::fmt;
use std::sync::Arc;
use tiny_skia::{IntSize, Pixmap};

/// Prefix of the serialized surface handed to persistence.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// A frozen copy of the whole drawing surface.
///
/// Cloning is cheap: the pixel buffer is shared.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl Snapshot {
    /// Capture the current contents of a pixmap.
    pub fn capture(pixmap: &Pixmap) -> Self {
        Self {
            width: pixmap.width(),
            height: pixmap.height(),
            pixels: Arc::from(pixmap.data()),
        }
    }

    /// Build a snapshot from raw premultiplied RGBA bytes.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> EngineResult<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(EngineError::Decode(format!(
                "expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: Arc::from(pixels),
        })
    }

    /// Decode a PNG into a snapshot.
    pub fn from_png(bytes: &[u8]) -> EngineResult<Self> {
        let pixmap = Pixmap::decode_png(bytes).map_err(|e| EngineError::Decode(e.to_string()))?;
        Ok(Self::capture(&pixmap))
    }

    /// Parse a `data:image/png;base64,` URL.
    pub fn from_data_url(data_url: &str) -> EngineResult<Self> {
        let encoded = data_url
            .trim()
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .ok_or_else(|| EngineError::InvalidDataUrl("expected a base64 PNG data URL".to_string()))?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| EngineError::InvalidDataUrl(e.to_string()))?;
        Self::from_png(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw premultiplied RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Decode the snapshot back into a pixmap.
    pub fn decode(&self) -> EngineResult<Pixmap> {
        let size = IntSize::from_wh(self.width, self.height).ok_or(EngineError::InvalidSurfaceSize {
            width: self.width,
            height: self.height,
        })?;
        Pixmap::from_vec(self.pixels.to_vec(), size)
            .ok_or_else(|| EngineError::Decode("pixel buffer does not match snapshot size".to_string()))
    }

    /// Encode the snapshot as PNG bytes.
    pub fn to_png(&self) -> EngineResult<Vec<u8>> {
        self.decode()?
            .encode_png()
            .map_err(|e| EngineError::Encode(e.to_string()))
    }

    /// Encode the snapshot as a base64 PNG data URL.
    pub fn to_data_url(&self) -> EngineResult<String> {
        let png = self.to_png()?;
        Ok(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png)))
    }

    /// Whether every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&b| b == 0)
    }
}

//! Person crop images.

use serde::{Deserialize, Serialize};

use crate::bbox::BBox;

/// A person crop cut from a decoded frame.
///
/// The pixel data is held as base64-encoded PNG so the crop can be shipped
/// to the matcher service and returned to API callers without re-encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crop {
    /// Base64-encoded PNG image
    pub image_base64: String,
    /// Source bounding box (clipped to frame bounds)
    pub bbox: BBox,
    /// Crop width in pixels
    pub width: u32,
    /// Crop height in pixels
    pub height: u32,
    /// Heuristic crop quality in `[0, 1]` (aspect, size, centrality)
    pub quality: f32,
}

impl Crop {
    /// Decode the PNG payload back to raw bytes.
    pub fn png_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        STANDARD.decode(&self.image_base64)
    }
}

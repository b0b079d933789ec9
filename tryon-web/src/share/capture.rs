//! Still capture of the composited try-on frame
//!
//! Capture only reads what is already on screen. It never touches the
//! session's calibration or transforms.

use serde::{Deserialize, Serialize};

use crate::error::ArError;

/// Encoded still image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedImage {
    pub mime_type: String,
    /// `data:` URL as produced by `canvas.toDataURL`
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// Image plus the metadata a share action needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    pub image: CapturedImage,
    pub product_name: String,
    /// Milliseconds since the Unix epoch
    pub captured_at_ms: f64,
}

impl CaptureResult {
    /// File name used when attaching the image to a share sheet
    pub fn file_name(&self) -> String {
        let slug: String = self
            .product_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let slug = slug
            .split('-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        let ext = match self.image.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        };
        if slug.is_empty() {
            format!("tryon-{}.{}", self.captured_at_ms as u64, ext)
        } else {
            format!("tryon-{}-{}.{}", slug, self.captured_at_ms as u64, ext)
        }
    }
}

/// Anything that can hand back the currently rendered composite
pub trait CompositeSource {
    fn snapshot(&self) -> Result<CapturedImage, ArError>;
}

/// Capture the current composite for `product_name`
pub fn capture(source: &dyn CompositeSource, product_name: &str, now_ms: f64) -> Result<CaptureResult, ArError> {
    let image = source.snapshot()?;
    if image.width == 0 || image.height == 0 {
        return Err(ArError::Capture("composite has zero size".into()));
    }
    if !image.data_url.starts_with("data:") || !image.data_url.contains(',') {
        return Err(ArError::Capture("composite did not encode to a data URL".into()));
    }
    Ok(CaptureResult {
        image,
        product_name: product_name.trim().to_string(),
        captured_at_ms: now_ms,
    })
}

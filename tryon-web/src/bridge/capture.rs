//! Canvas readback for still capture

use web_sys::HtmlCanvasElement;

use crate::error::{describe_js, ArError};
use crate::share::{CapturedImage, CompositeSource};

/// Canvas the host composites the camera frame and overlay onto
pub struct CanvasSource {
    canvas: HtmlCanvasElement,
    mime_type: &'static str,
}

impl CanvasSource {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, mime_type: "image/png" }
    }
}

impl CompositeSource for CanvasSource {
    fn snapshot(&self) -> Result<CapturedImage, ArError> {
        let data_url = self
            .canvas
            .to_data_url_with_type(self.mime_type)
            .map_err(|e| ArError::Capture(describe_js(&e)))?;
        Ok(CapturedImage {
            mime_type: self.mime_type.to_string(),
            data_url,
            width: self.canvas.width(),
            height: self.canvas.height(),
        })
    }
}

//! Platform capability snapshot
//!
//! Filled in once by the JS bridge at session start. Everything downstream
//! (tracker factory, native AR selection) reads this instead of probing the
//! browser again.

use serde::{Deserialize, Serialize};

/// What the current device/browser can do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformCapabilities {
    /// `getUserMedia` is present and a camera was granted
    pub camera: bool,
    /// WebGL/WebGPU context available for the landmark runtime
    pub gpu: bool,
    /// `navigator.xr` reports immersive-ar support
    pub webxr: bool,
    /// Android with ARCore Scene Viewer intent support
    pub scene_viewer: bool,
    /// iOS Safari with AR Quick Look
    pub quick_look: bool,
}

impl PlatformCapabilities {
    /// Enough for the 2D landmark overlay path
    pub fn supports_tracking(&self) -> bool {
        self.camera && self.gpu
    }

    /// Any hardware AR viewer at all
    pub fn supports_native_ar(&self) -> bool {
        self.webxr || self.scene_viewer || self.quick_look
    }

    /// Human readable reason tracking is unavailable, if it is
    pub fn tracking_blocker(&self) -> Option<&'static str> {
        match (self.camera, self.gpu) {
            (true, true) => None,
            (false, _) => Some("camera not available"),
            (true, false) => Some("GPU acceleration not available"),
        }
    }
}

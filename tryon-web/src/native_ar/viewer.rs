//! Native AR Bridge - hands 3D assets to the platform viewer
//!
//! Selection happens once per session. When a product has a 3D model and
//! the device has a hardware AR path, the session hands everything to a
//! `<model-viewer>` element and the 2D landmark pipeline never starts.

use log::info;
use serde::{Deserialize, Serialize};

use crate::asset::AssetReference;
use crate::error::ArError;
use crate::platform::PlatformCapabilities;

/// AR modes understood by `<model-viewer ar-modes="...">`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArMode {
    #[serde(rename = "webxr")]
    WebXr,
    SceneViewer,
    QuickLook,
}

impl ArMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArMode::WebXr => "webxr",
            ArMode::SceneViewer => "scene-viewer",
            ArMode::QuickLook => "quick-look",
        }
    }
}

/// Presentation hints, passed through to the viewer untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerOptions {
    pub auto_rotate: bool,
    pub camera_controls: bool,
    pub shadow_intensity: Option<f32>,
    pub exposure: Option<f32>,
    pub poster: Option<String>,
    pub alt: Option<String>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            auto_rotate: true,
            camera_controls: true,
            shadow_intensity: None,
            exposure: None,
            poster: None,
            alt: None,
        }
    }
}

/// Everything the host needs to build the viewer element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    /// glTF/GLB model; absent for USDZ-only products
    pub src: Option<String>,
    pub ios_src: Option<String>,
    pub poster: Option<String>,
    pub ar_modes: Vec<ArMode>,
    pub camera_controls: bool,
    pub auto_rotate: bool,
    pub shadow_intensity: Option<f32>,
    pub exposure: Option<f32>,
    pub alt: Option<String>,
}

impl ViewerConfig {
    /// `<model-viewer>` attributes in a stable order. Flags carry "".
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = Vec::new();
        if let Some(src) = &self.src {
            attrs.push(("src", src.clone()));
        }
        attrs.push(("ar", String::new()));
        let modes: Vec<&str> = self.ar_modes.iter().map(ArMode::as_str).collect();
        attrs.push(("ar-modes", modes.join(" ")));
        if let Some(ios) = &self.ios_src {
            attrs.push(("ios-src", ios.clone()));
        }
        if let Some(poster) = &self.poster {
            attrs.push(("poster", poster.clone()));
        }
        if self.camera_controls {
            attrs.push(("camera-controls", String::new()));
        }
        if self.auto_rotate {
            attrs.push(("auto-rotate", String::new()));
        }
        if let Some(v) = self.shadow_intensity {
            attrs.push(("shadow-intensity", v.to_string()));
        }
        if let Some(v) = self.exposure {
            attrs.push(("exposure", v.to_string()));
        }
        if let Some(alt) = &self.alt {
            attrs.push(("alt", alt.clone()));
        }
        attrs
    }
}

/// Frozen per-session decision about the native AR path
#[derive(Debug, Clone, PartialEq)]
pub struct NativeArBridge {
    modes: Vec<ArMode>,
}

impl NativeArBridge {
    /// One-time detection for a session
    pub fn detect(caps: &PlatformCapabilities, asset: &AssetReference) -> Self {
        let mut modes = Vec::new();
        if asset.model().is_some() {
            if caps.webxr {
                modes.push(ArMode::WebXr);
            }
            if caps.scene_viewer {
                modes.push(ArMode::SceneViewer);
            }
        }
        // model-viewer converts GLB to USDZ on the fly when no USDZ is given
        if caps.quick_look && asset.has_model() {
            modes.push(ArMode::QuickLook);
        }
        if !modes.is_empty() {
            info!("Native AR available: {:?}", modes);
        }
        Self { modes }
    }

    pub fn is_supported(&self) -> bool {
        !self.modes.is_empty()
    }

    pub fn modes(&self) -> &[ArMode] {
        &self.modes
    }

    /// Viewer configuration for `asset`; errors when the path is unsupported
    pub fn render(&self, asset: &AssetReference, options: &ViewerOptions) -> Result<ViewerConfig, ArError> {
        if !self.is_supported() {
            return Err(ArError::Capability("native AR viewer not supported".into()));
        }
        if !asset.has_model() {
            return Err(ArError::Capability("product has no 3D model".into()));
        }

        Ok(ViewerConfig {
            src: asset.model().map(str::to_string),
            ios_src: asset.ios_model().map(str::to_string),
            poster: options.poster.clone().or_else(|| asset.poster_url.clone()),
            ar_modes: self.modes.clone(),
            camera_controls: options.camera_controls,
            auto_rotate: options.auto_rotate,
            shadow_intensity: options.shadow_intensity,
            exposure: options.exposure,
            alt: options.alt.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_ar() -> PlatformCapabilities {
        PlatformCapabilities {
            camera: true,
            gpu: true,
            webxr: true,
            scene_viewer: true,
            quick_look: true,
        }
    }

    fn with_model() -> AssetReference {
        AssetReference {
            image_url: "ring.png".into(),
            model_url: Some("ring.glb".into()),
            ios_model_url: None,
            poster_url: Some("ring-poster.webp".into()),
        }
    }

    #[test]
    fn test_no_model_never_supported() {
        let bridge = NativeArBridge::detect(&all_ar(), &AssetReference::image("ring.png"));
        assert!(!bridge.is_supported());
        assert!(bridge.render(&AssetReference::image("ring.png"), &ViewerOptions::default()).is_err());
    }

    #[test]
    fn test_no_platform_support() {
        let caps = PlatformCapabilities { camera: true, gpu: true, ..Default::default() };
        assert!(!NativeArBridge::detect(&caps, &with_model()).is_supported());
    }

    #[test]
    fn test_modes_follow_platform() {
        let android = PlatformCapabilities { scene_viewer: true, webxr: true, ..Default::default() };
        let bridge = NativeArBridge::detect(&android, &with_model());
        assert_eq!(bridge.modes(), &[ArMode::WebXr, ArMode::SceneViewer]);

        let ios = PlatformCapabilities { quick_look: true, ..Default::default() };
        assert_eq!(NativeArBridge::detect(&ios, &with_model()).modes(), &[ArMode::QuickLook]);
    }

    #[test]
    fn test_render_passes_options_through() {
        let asset = with_model();
        let bridge = NativeArBridge::detect(&all_ar(), &asset);
        let options = ViewerOptions {
            auto_rotate: false,
            camera_controls: true,
            shadow_intensity: Some(0.7),
            exposure: Some(1.1),
            poster: None,
            alt: Some("Gold ring".into()),
        };
        let cfg = bridge.render(&asset, &options).unwrap();
        assert_eq!(cfg.src.as_deref(), Some("ring.glb"));
        assert_eq!(cfg.poster.as_deref(), Some("ring-poster.webp"));
        assert!(!cfg.auto_rotate);
        assert_eq!(cfg.shadow_intensity, Some(0.7));

        let attrs = cfg.attributes();
        assert!(attrs.contains(&("ar-modes", "webxr scene-viewer quick-look".to_string())));
        assert!(attrs.contains(&("camera-controls", String::new())));
        assert!(!attrs.iter().any(|(k, _)| *k == "auto-rotate"));
        assert!(attrs.contains(&("exposure", "1.1".to_string())));
    }

    #[test]
    fn test_usdz_only_asset_leaves_src_empty() {
        let asset = AssetReference {
            image_url: "ring.png".into(),
            model_url: None,
            ios_model_url: Some("ring.usdz".into()),
            poster_url: None,
        };
        let ios = PlatformCapabilities { quick_look: true, ..Default::default() };
        let cfg = NativeArBridge::detect(&ios, &asset).render(&asset, &ViewerOptions::default()).unwrap();
        assert_eq!(cfg.src, None);
        assert_eq!(cfg.ios_src.as_deref(), Some("ring.usdz"));

        let attrs = cfg.attributes();
        assert!(!attrs.iter().any(|(k, _)| *k == "src"));
        assert!(attrs.contains(&("ios-src", "ring.usdz".to_string())));
    }
}

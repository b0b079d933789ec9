//! Read-only product asset references handed over by the catalog

use serde::{Deserialize, Serialize};

/// Overlay image and optional 3D model for one product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetReference {
    /// Transparent PNG drawn by the 2D overlay path
    pub image_url: String,
    /// glTF/GLB model for WebXR and Scene Viewer
    pub model_url: Option<String>,
    /// USDZ model for AR Quick Look
    pub ios_model_url: Option<String>,
    /// Still shown while the viewer loads
    pub poster_url: Option<String>,
}

impl AssetReference {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            image_url: url.into(),
            ..Default::default()
        }
    }

    /// The product ships a usable 3D model
    pub fn has_model(&self) -> bool {
        non_blank(&self.model_url).is_some() || non_blank(&self.ios_model_url).is_some()
    }

    pub fn model(&self) -> Option<&str> {
        non_blank(&self.model_url)
    }

    pub fn ios_model(&self) -> Option<&str> {
        non_blank(&self.ios_model_url)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

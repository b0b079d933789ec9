//! Engine configuration
//!
//! Every field has a default so hosts only send what they override, either
//! as a JSON string or a plain JS object.

use serde::{Deserialize, Serialize};

use crate::error::ArError;
use crate::native_ar::ViewerOptions;
use crate::placement::{CalibrationBounds, PlacementConfig, SmoothingConfig};
use crate::session::{HoldConfig, MAX_HOLD_FRAMES};
use crate::share::ShareConfig;

/// Complete tuning for one try-on session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub placement: PlacementConfig,
    pub calibration_bounds: CalibrationBounds,
    pub hold: HoldConfig,
    pub smoothing: SmoothingConfig,
    pub share: ShareConfig,
    pub viewer: ViewerOptions,
    /// Selfie preview is drawn flipped; landmark x is mirrored to match
    pub mirror: bool,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ArError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validated()
    }

    /// Reject values the engine cannot work with
    pub fn validated(mut self) -> Result<Self, ArError> {
        if !(self.placement.asset_base_width.is_finite() && self.placement.asset_base_width > 0.0) {
            return Err(ArError::Config(format!(
                "assetBaseWidth must be positive, got {}",
                self.placement.asset_base_width
            )));
        }
        self.calibration_bounds = self.calibration_bounds.sanitized();
        self.hold.hold_frames = self.hold.hold_frames.min(MAX_HOLD_FRAMES);
        Ok(self)
    }
}

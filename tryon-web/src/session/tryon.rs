//! Try-on session - one product, one category, one mode
//!
//! The mode is picked once at start. A native viewer session never touches
//! the landmark pipeline; an overlay session turns each frame's landmarks
//! into a placement, holding briefly across gaps. Calibration lives and dies
//! with the session.

use log::{debug, info, warn};
use serde::Serialize;

use super::hold::{HoldDecision, TrackingHold};
use crate::asset::AssetReference;
use crate::config::EngineConfig;
use crate::error::ArError;
use crate::native_ar::{NativeArBridge, ViewerConfig};
use crate::placement::{
    Calibration, CalibrationController, CalibrationUpdate, Category, Placement, PlacementEngine, TransformSmoother,
};
use crate::platform::PlatformCapabilities;
use crate::tracking::{to_pixels, LandmarkSet, ModelHandle, ModelKind, Viewport};

// ============================================================================
// TYPES
// ============================================================================

/// How this session presents the product
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMode {
    /// Hardware AR via `<model-viewer>`
    NativeViewer(ViewerConfig),
    /// 2D overlay on the camera preview
    Overlay,
}

/// Coarse state for the hosting UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "camelCase")]
pub enum SessionState {
    /// Waiting for the model or the first frame
    Loading,
    Tracking,
    /// Showing the last placement across a tracking gap
    Holding,
    /// No subject in view
    Lost,
    /// Terminal. Camera, GPU or model missing.
    Unavailable(String),
    NativeViewer,
}

/// What to draw for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FrameOutput {
    Show {
        placement: Placement,
        opacity: f32,
        fresh: bool,
    },
    Hidden,
}

// ============================================================================
// SESSION
// ============================================================================

pub struct TryOnSession<F> {
    category: Category,
    asset: AssetReference,
    mode: SessionMode,
    state: SessionState,
    engine: PlacementEngine,
    calibration: CalibrationController,
    smoother: TransformSmoother,
    hold: TrackingHold,
    mirror: bool,
    model: Option<ModelHandle<F>>,
    /// Handle whose release was refused by an in-flight inference
    pending_release: Option<ModelHandle<F>>,
    ended: bool,
}

impl<F> TryOnSession<F> {
    /// Start a session and freeze its mode
    pub fn start(category: Category, asset: AssetReference, caps: &PlatformCapabilities, config: &EngineConfig) -> Self {
        let native = NativeArBridge::detect(caps, &asset);
        let mode = if native.is_supported() {
            match native.render(&asset, &config.viewer) {
                Ok(viewer) => SessionMode::NativeViewer(viewer),
                Err(err) => {
                    warn!("Native viewer rejected, falling back to overlay: {}", err);
                    SessionMode::Overlay
                }
            }
        } else {
            SessionMode::Overlay
        };

        let state = match (&mode, caps.tracking_blocker()) {
            (SessionMode::NativeViewer(_), _) => SessionState::NativeViewer,
            (SessionMode::Overlay, Some(reason)) => {
                SessionState::Unavailable(ArError::Capability(reason.to_string()).to_string())
            }
            (SessionMode::Overlay, None) => SessionState::Loading,
        };
        info!("Try-on session started: {} ({:?})", category, state);

        Self {
            category,
            asset,
            mode,
            state,
            engine: PlacementEngine::new(config.placement),
            calibration: CalibrationController::new(config.calibration_bounds),
            smoother: TransformSmoother::new(&config.smoothing),
            hold: TrackingHold::new(config.hold),
            mirror: config.mirror,
            model: None,
            pending_release: None,
            ended: false,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn asset(&self) -> &AssetReference {
        &self.asset
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_native(&self) -> bool {
        matches!(self.mode, SessionMode::NativeViewer(_))
    }

    /// Landmark pipeline this session needs, if it needs one at all
    pub fn model_kind(&self) -> Option<ModelKind> {
        let overlay_live = !self.is_native() && !self.ended && !matches!(self.state, SessionState::Unavailable(_));
        overlay_live.then(|| self.category.model_kind())
    }

    /// Viewport for a surface of this size, honoring the mirror setting
    pub fn viewport(&self, width: f32, height: f32) -> Viewport {
        if self.mirror {
            Viewport::mirrored(width, height)
        } else {
            Viewport::new(width, height)
        }
    }

    // ------------------------------------------------------------------------
    // Model handle
    // ------------------------------------------------------------------------

    pub fn attach_model(&mut self, handle: ModelHandle<F>) {
        if self.ended {
            return;
        }
        debug!("{} model attached to {} session", handle.kind(), self.category);
        self.model = Some(handle);
    }

    pub fn model(&self) -> Option<&ModelHandle<F>> {
        self.model.as_ref()
    }

    /// Enter the terminal unavailable state
    pub fn fail(&mut self, err: &ArError) {
        warn!("Try-on session unavailable: {}", err);
        self.hold.clear();
        self.set_state(SessionState::Unavailable(err.to_string()));
    }

    // ------------------------------------------------------------------------
    // Calibration
    // ------------------------------------------------------------------------

    pub fn calibration(&self) -> Calibration {
        self.calibration.get()
    }

    pub fn set_calibration(&mut self, update: CalibrationUpdate) -> Calibration {
        // Apply on the very next frame instead of easing into it
        self.smoother.reset();
        self.calibration.set(update)
    }

    pub fn nudge_calibration(&mut self, d_scale: f32, d_x: f32, d_y: f32) -> Calibration {
        self.smoother.reset();
        self.calibration.nudge(d_scale, d_x, d_y)
    }

    pub fn reset_calibration(&mut self) -> Calibration {
        self.smoother.reset();
        self.calibration.reset()
    }

    // ------------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------------

    /// Turn one frame's landmarks (or their absence) into draw output
    pub fn on_frame(&mut self, landmarks: Option<&LandmarkSet>, viewport: &Viewport, now_ms: f64) -> FrameOutput {
        if self.model_kind().is_none() {
            return FrameOutput::Hidden;
        }

        let raw = landmarks
            .and_then(|set| to_pixels(set, self.category, viewport))
            .and_then(|anchors| self.engine.place(&anchors, self.category, &self.calibration.get()));

        let smoothed = raw.map(|placement| {
            if self.hold.after_gap() {
                self.smoother.reset();
            }
            self.smoother.apply(now_ms, placement)
        });

        match self.hold.observe(smoothed) {
            HoldDecision::Show { placement, opacity, fresh } => {
                self.set_state(if fresh { SessionState::Tracking } else { SessionState::Holding });
                FrameOutput::Show { placement, opacity, fresh }
            }
            HoldDecision::Hide => {
                self.set_state(SessionState::Lost);
                FrameOutput::Hidden
            }
        }
    }

    /// Release the model handle and stop producing output
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.hold.clear();
        self.smoother.reset();
        if let Some(handle) = self.model.take() {
            if !handle.release() {
                self.pending_release = Some(handle);
            }
        }
        info!("Try-on session ended: {}", self.category);
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Retry a release deferred by `end`. Call once the model is idle again.
    pub fn finish_release(&mut self) {
        if let Some(handle) = self.pending_release.take() {
            if !handle.release() {
                self.pending_release = Some(handle);
            }
        }
    }

    pub fn release_pending(&self) -> bool {
        self.pending_release.is_some()
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            debug!("Session state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

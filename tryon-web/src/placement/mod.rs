//! Placement module - overlay geometry, calibration and smoothing
//!
//! Re-exports only. All logic in submodules.

mod calibration;
mod category;
mod engine;
mod smoothing;

pub use calibration::{Calibration, CalibrationBounds, CalibrationController, CalibrationUpdate};
pub use category::Category;
pub use engine::{
    compute_earring_transforms, compute_necklace_transform, compute_ring_transform, compute_transform,
    EarringPair, OverlayTransform, Placement, PlacementConfig, PlacementEngine,
};
pub use smoothing::{OneEuroFilter, SmoothingConfig, TransformSmoother};

//! Placement Engine - anchors + category + calibration -> overlay transform
//!
//! Each category is a pure function of its anchors. Calibration is applied
//! last: scale multiplies, offsets add, always in that order.
//!
//! Screen conventions: y grows downward, rotation is in degrees and positive
//! clockwise (CSS `rotate()`), scale is relative to `asset_base_width`.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use super::calibration::Calibration;
use super::category::Category;
use crate::tracking::AnchorPoints;

/// Final transform applied to the jewelry image for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayTransform {
    pub x: f32,
    pub y: f32,
    pub rotation_deg: f32,
    pub scale: f32,
}

/// One transform per ear
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarringPair {
    pub left: OverlayTransform,
    pub right: OverlayTransform,
}

/// Engine output for a category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Placement {
    Single(OverlayTransform),
    Pair(EarringPair),
}

impl Placement {
    pub fn transforms(&self) -> Vec<OverlayTransform> {
        match self {
            Placement::Single(t) => vec![*t],
            Placement::Pair(p) => vec![p.left, p.right],
        }
    }
}

/// Empirically tuned placement constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacementConfig {
    /// Natural width (px) the overlay images are authored at
    pub asset_base_width: f32,
    /// Earring width as a fraction of inter-ear distance
    pub earring_width_ratio: f32,
    /// Fraction of the ear-to-ear vector an earring moves inward
    pub ear_inset: f32,
    /// Earring drop below the ear point, as a fraction of inter-ear distance
    pub ear_drop: f32,
    /// Necklace width as a fraction of inter-ear distance
    pub necklace_width_ratio: f32,
    /// Weight of chin vs nose for the necklace reference (1 = chin only)
    pub necklace_chin_weight: f32,
    /// Necklace drop below the reference, as a fraction of inter-ear distance
    pub necklace_drop: f32,
    /// Ring width as a fraction of fingertip-to-joint distance
    pub ring_width_ratio: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            asset_base_width: 100.0,
            earring_width_ratio: 0.18,
            ear_inset: 0.04,
            ear_drop: 0.12,
            necklace_width_ratio: 1.35,
            necklace_chin_weight: 0.85,
            necklace_drop: 0.35,
            ring_width_ratio: 0.9,
        }
    }
}

// ============================================================================
// GEOMETRY HELPERS
// ============================================================================

/// Clockwise angle (degrees) between screen-down and `v`
fn angle_from_down(v: Vector2<f32>) -> f32 {
    (-v.x).atan2(v.y).to_degrees()
}

/// Clockwise angle (degrees) between screen-up and `v`
fn angle_from_up(v: Vector2<f32>) -> f32 {
    v.x.atan2(-v.y).to_degrees()
}

/// Roll of the line through both points, ordered left-to-right on screen
fn line_roll(a: Point2<f32>, b: Point2<f32>) -> f32 {
    let (l, r) = if a.x <= b.x { (a, b) } else { (b, a) };
    let v = r - l;
    v.y.atan2(v.x).to_degrees()
}

fn calibrated(x: f32, y: f32, rotation_deg: f32, scale: f32, cal: &Calibration) -> OverlayTransform {
    OverlayTransform {
        x: x + cal.offset_x,
        y: y + cal.offset_y,
        rotation_deg,
        scale: scale * cal.scale,
    }
}

// ============================================================================
// PER-CATEGORY PLACEMENT
// ============================================================================

/// Earring transforms for both ears
pub fn compute_earring_transforms(
    anchors: &AnchorPoints,
    cal: &Calibration,
    cfg: &PlacementConfig,
) -> Option<EarringPair> {
    let AnchorPoints::Face { left_ear, right_ear, chin, .. } = *anchors else {
        return None;
    };

    let span = right_ear - left_ear;
    let ear_distance = span.norm();
    let scale = ear_distance * cfg.earring_width_ratio / cfg.asset_base_width;

    // Ear->chin vectors mirror each other on an upright face, so their mean
    // angle is the head tilt.
    let tilt = (angle_from_down(chin - left_ear) + angle_from_down(chin - right_ear)) / 2.0;
    let drop = Vector2::new(0.0, cfg.ear_drop * ear_distance);

    let left = left_ear + span * cfg.ear_inset + drop;
    let right = right_ear - span * cfg.ear_inset + drop;

    Some(EarringPair {
        left: calibrated(left.x, left.y, tilt, scale, cal),
        right: calibrated(right.x, right.y, tilt, scale, cal),
    })
}

/// Necklace transform below the chin
pub fn compute_necklace_transform(
    anchors: &AnchorPoints,
    cal: &Calibration,
    cfg: &PlacementConfig,
) -> Option<OverlayTransform> {
    let AnchorPoints::Face { left_ear, right_ear, nose, chin } = *anchors else {
        return None;
    };

    let ear_distance = nalgebra::distance(&left_ear, &right_ear);
    let w = cfg.necklace_chin_weight.clamp(0.0, 1.0);
    let reference_y = nose.y + (chin.y - nose.y) * w;

    let x = (left_ear.x + right_ear.x) / 2.0;
    let y = reference_y + cfg.necklace_drop * ear_distance;
    let scale = ear_distance * cfg.necklace_width_ratio / cfg.asset_base_width;

    Some(calibrated(x, y, line_roll(left_ear, right_ear), scale, cal))
}

/// Ring transform at the fingertip
pub fn compute_ring_transform(
    anchors: &AnchorPoints,
    cal: &Calibration,
    cfg: &PlacementConfig,
) -> Option<OverlayTransform> {
    let AnchorPoints::Hand { fingertip, joint } = *anchors else {
        return None;
    };

    let finger = fingertip - joint;
    let scale = finger.norm() * cfg.ring_width_ratio / cfg.asset_base_width;

    Some(calibrated(fingertip.x, fingertip.y, angle_from_up(finger), scale, cal))
}

/// Single transform for `category`. Earrings report the left ear.
///
/// `None` when the anchors are of the wrong shape for the category.
pub fn compute_transform(
    anchors: &AnchorPoints,
    category: Category,
    cal: &Calibration,
    cfg: &PlacementConfig,
) -> Option<OverlayTransform> {
    match category {
        Category::Earrings => compute_earring_transforms(anchors, cal, cfg).map(|pair| pair.left),
        Category::Necklace => compute_necklace_transform(anchors, cal, cfg),
        Category::Ring => compute_ring_transform(anchors, cal, cfg),
    }
}

/// Stateless engine bound to one set of constants
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementEngine {
    config: PlacementConfig,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Full placement for a category (both ears for earrings)
    pub fn place(&self, anchors: &AnchorPoints, category: Category, cal: &Calibration) -> Option<Placement> {
        match category {
            Category::Earrings => compute_earring_transforms(anchors, cal, &self.config).map(Placement::Pair),
            Category::Necklace | Category::Ring => {
                compute_transform(anchors, category, cal, &self.config).map(Placement::Single)
            }
        }
    }
}

//! Landmark data produced by one inference pass
//!
//! Coordinates are normalized (0-1) in the camera frame, exactly as the
//! MediaPipe tasks emit them. Index constants name the few points the
//! overlay engine reads.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// LANDMARK INDICES
// ============================================================================

/// MediaPipe Face Mesh (468 points)
pub mod face {
    pub const NOSE_TIP: usize = 1;
    pub const CHIN: usize = 152;
    /// Left tragus region (subject's right on a mirrored preview)
    pub const LEFT_EAR: usize = 234;
    pub const RIGHT_EAR: usize = 454;
    pub const POINT_COUNT: usize = 468;
}

/// MediaPipe Hands (21 points)
pub mod hand {
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const POINT_COUNT: usize = 21;
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Which landmark pipeline produced a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Face,
    Hand,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Face => "face",
            ModelKind::Hand => "hand",
        }
    }

    /// Parse the identifier used by the JS side
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "face" => Some(ModelKind::Face),
            "hand" => Some(ModelKind::Hand),
            _ => None,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single landmark (normalized coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,  // 0-1 normalized
    pub y: f32,  // 0-1 normalized
    #[serde(default)]
    pub z: f32,  // Relative depth, unused by the 2D overlay
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Ordered landmarks from one inference pass. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    kind: ModelKind,
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(kind: ModelKind, points: Vec<Landmark>) -> Self {
        Self { kind, points }
    }

    /// Build from a flat `[x0, y0, z0, x1, ...]` buffer as handed over by JS.
    ///
    /// A trailing partial triple is ignored.
    pub fn from_flat(kind: ModelKind, data: &[f32]) -> Self {
        let points = data
            .chunks_exact(3)
            .map(|c| Landmark { x: c[0], y: c[1], z: c[2] })
            .collect();
        Self { kind, points }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_drops_partial_triple() {
        let set = LandmarkSet::from_flat(ModelKind::Hand, &[0.1, 0.2, 0.0, 0.3, 0.4, 0.0, 0.9]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1), Some(Landmark { x: 0.3, y: 0.4, z: 0.0 }));
        assert_eq!(set.get(2), None);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ModelKind::parse("Face"), Some(ModelKind::Face));
        assert_eq!(ModelKind::parse(" hand "), Some(ModelKind::Hand));
        assert_eq!(ModelKind::parse("pose"), None);
    }
}

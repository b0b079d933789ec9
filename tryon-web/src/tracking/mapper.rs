//! Landmark Mapper - normalized landmarks to pixel-space anchors
//!
//! Pure per-axis scaling; no lens distortion correction. A set that is too
//! short, of the wrong kind, or holding non-finite coordinates produces no
//! anchors at all rather than a half-filled record.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use super::landmarks::{face, hand, LandmarkSet};
use crate::placement::Category;

/// Target surface the overlay is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Preview is horizontally flipped (selfie camera)
    #[serde(default)]
    pub mirror: bool,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height, mirror: false }
    }

    pub fn mirrored(width: f32, height: f32) -> Self {
        Self { width, height, mirror: true }
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Pixel-space anchor points for one category
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorPoints {
    Face {
        left_ear: Point2<f32>,
        right_ear: Point2<f32>,
        nose: Point2<f32>,
        chin: Point2<f32>,
    },
    Hand {
        fingertip: Point2<f32>,
        joint: Point2<f32>,
    },
}

impl AnchorPoints {
    /// Distance between the ear points (face anchors only)
    pub fn ear_distance(&self) -> Option<f32> {
        match self {
            AnchorPoints::Face { left_ear, right_ear, .. } => Some(nalgebra::distance(left_ear, right_ear)),
            AnchorPoints::Hand { .. } => None,
        }
    }
}

/// Highest landmark index a category reads
pub fn required_len(category: Category) -> usize {
    let max_index = match category {
        Category::Earrings | Category::Necklace => {
            [face::LEFT_EAR, face::RIGHT_EAR, face::NOSE_TIP, face::CHIN]
                .into_iter()
                .max()
                .unwrap_or(face::RIGHT_EAR)
        }
        Category::Ring => hand::RING_TIP.max(hand::RING_PIP),
    };
    max_index + 1
}

/// Map a landmark set to the anchors `category` needs
pub fn to_pixels(set: &LandmarkSet, category: Category, viewport: &Viewport) -> Option<AnchorPoints> {
    if set.kind() != category.model_kind() || set.len() < required_len(category) || !viewport.is_valid() {
        return None;
    }

    let px = |index: usize| -> Option<Point2<f32>> {
        let lm = set.get(index)?;
        if !lm.is_finite() {
            return None;
        }
        let x = if viewport.mirror { 1.0 - lm.x } else { lm.x };
        Some(Point2::new(x * viewport.width, lm.y * viewport.height))
    };

    match category {
        Category::Earrings | Category::Necklace => Some(AnchorPoints::Face {
            left_ear: px(face::LEFT_EAR)?,
            right_ear: px(face::RIGHT_EAR)?,
            nose: px(face::NOSE_TIP)?,
            chin: px(face::CHIN)?,
        }),
        Category::Ring => Some(AnchorPoints::Hand {
            fingertip: px(hand::RING_TIP)?,
            joint: px(hand::RING_PIP)?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::landmarks::{Landmark, ModelKind};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn face_set(len: usize) -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5); len];
        if len > face::RIGHT_EAR {
            points[face::LEFT_EAR] = Landmark::new(0.25, 0.4);
            points[face::RIGHT_EAR] = Landmark::new(0.75, 0.4);
            points[face::NOSE_TIP] = Landmark::new(0.5, 0.45);
            points[face::CHIN] = Landmark::new(0.5, 0.7);
        }
        LandmarkSet::new(ModelKind::Face, points)
    }

    #[test]
    fn test_face_anchors_scaled_to_viewport() {
        let anchors = to_pixels(&face_set(face::POINT_COUNT), Category::Necklace, &Viewport::new(400.0, 500.0))
            .unwrap();
        match anchors {
            AnchorPoints::Face { left_ear, right_ear, nose, chin } => {
                assert_relative_eq!(left_ear.x, 100.0);
                assert_relative_eq!(left_ear.y, 200.0);
                assert_relative_eq!(right_ear.x, 300.0);
                assert_relative_eq!(nose.y, 225.0);
                assert_relative_eq!(chin.y, 350.0);
            }
            AnchorPoints::Hand { .. } => panic!("expected face anchors"),
        }
        assert_relative_eq!(anchors.ear_distance().unwrap(), 200.0);
    }

    #[test]
    fn test_mirrored_viewport_flips_x() {
        let anchors =
            to_pixels(&face_set(face::POINT_COUNT), Category::Earrings, &Viewport::mirrored(400.0, 500.0)).unwrap();
        if let AnchorPoints::Face { left_ear, right_ear, .. } = anchors {
            assert_relative_eq!(left_ear.x, 300.0);
            assert_relative_eq!(right_ear.x, 100.0);
        }
    }

    #[test]
    fn test_hand_anchors() {
        let mut points = vec![Landmark::default(); hand::POINT_COUNT];
        points[hand::RING_TIP] = Landmark::new(0.5, 0.2);
        points[hand::RING_PIP] = Landmark::new(0.5, 0.4);
        let set = LandmarkSet::new(ModelKind::Hand, points);
        let anchors = to_pixels(&set, Category::Ring, &Viewport::new(100.0, 100.0)).unwrap();
        assert_eq!(
            anchors,
            AnchorPoints::Hand {
                fingertip: Point2::new(50.0, 20.0),
                joint: Point2::new(50.0, 40.0),
            }
        );
    }

    #[test]
    fn test_wrong_kind_yields_none() {
        let set = face_set(face::POINT_COUNT);
        assert_eq!(to_pixels(&set, Category::Ring, &Viewport::new(100.0, 100.0)), None);
    }

    #[test]
    fn test_non_finite_landmark_yields_none() {
        let mut points = face_set(face::POINT_COUNT).points().to_vec();
        points[face::CHIN] = Landmark::new(f32::NAN, 0.7);
        let set = LandmarkSet::new(ModelKind::Face, points);
        assert_eq!(to_pixels(&set, Category::Earrings, &Viewport::new(100.0, 100.0)), None);
    }

    #[test]
    fn test_degenerate_viewport_yields_none() {
        let set = face_set(face::POINT_COUNT);
        assert_eq!(to_pixels(&set, Category::Earrings, &Viewport::new(0.0, 100.0)), None);
    }

    proptest! {
        #[test]
        fn prop_short_sets_never_map(len in 0usize..required_len(Category::Earrings)) {
            let set = face_set(len);
            prop_assert!(to_pixels(&set, Category::Earrings, &Viewport::new(640.0, 480.0)).is_none());
            prop_assert!(to_pixels(&set, Category::Necklace, &Viewport::new(640.0, 480.0)).is_none());
        }

        #[test]
        fn prop_sufficient_sets_always_map(
            len in required_len(Category::Necklace)..600usize,
            xs in proptest::collection::vec(0.0f32..1.0, 4),
        ) {
            let mut points = vec![Landmark::new(0.5, 0.5); len];
            points[face::LEFT_EAR] = Landmark::new(xs[0], xs[1]);
            points[face::RIGHT_EAR] = Landmark::new(xs[2], xs[3]);
            let set = LandmarkSet::new(ModelKind::Face, points);
            prop_assert!(to_pixels(&set, Category::Necklace, &Viewport::new(640.0, 480.0)).is_some());
        }

        #[test]
        fn prop_short_hand_sets_never_map(len in 0usize..required_len(Category::Ring)) {
            let set = LandmarkSet::new(ModelKind::Hand, vec![Landmark::new(0.5, 0.5); len]);
            prop_assert!(to_pixels(&set, Category::Ring, &Viewport::new(640.0, 480.0)).is_none());
        }
    }
}

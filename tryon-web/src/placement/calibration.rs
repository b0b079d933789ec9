//! Calibration Controller - user nudges layered over the geometric estimate
//!
//! Values are clamped on the way in; out-of-range input is never an error.

use serde::{Deserialize, Serialize};

/// User-adjustable placement tweak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    /// Multiplier on the computed overlay scale
    pub scale: f32,
    /// Pixel delta added to the overlay x
    pub offset_x: f32,
    /// Pixel delta added to the overlay y
    pub offset_y: f32,
}

impl Calibration {
    pub const IDENTITY: Calibration = Calibration {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };
}

impl Default for Calibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Partial update; `None` fields keep their current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalibrationUpdate {
    pub scale: Option<f32>,
    pub offset_x: Option<f32>,
    pub offset_y: Option<f32>,
}

/// Allowed calibration ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalibrationBounds {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Offsets are clamped to `[-max_offset, max_offset]`
    pub max_offset: f32,
}

impl Default for CalibrationBounds {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 1.5,
            max_offset: 50.0,
        }
    }
}

impl CalibrationBounds {
    /// Bounds with min/max swapped back into order and the identity inside
    pub(crate) fn sanitized(self) -> Self {
        let (lo, hi) = if self.min_scale <= self.max_scale {
            (self.min_scale, self.max_scale)
        } else {
            (self.max_scale, self.min_scale)
        };
        Self {
            min_scale: lo.clamp(f32::MIN_POSITIVE, 1.0),
            max_scale: hi.max(1.0),
            max_offset: self.max_offset.abs(),
        }
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }

    fn clamp_offset(&self, offset: f32) -> f32 {
        offset.clamp(-self.max_offset, self.max_offset)
    }
}

/// Session-owned calibration state
#[derive(Debug, Clone)]
pub struct CalibrationController {
    current: Calibration,
    bounds: CalibrationBounds,
}

impl CalibrationController {
    pub fn new(bounds: CalibrationBounds) -> Self {
        Self {
            current: Calibration::IDENTITY,
            bounds: bounds.sanitized(),
        }
    }

    pub fn get(&self) -> Calibration {
        self.current
    }

    pub fn bounds(&self) -> CalibrationBounds {
        self.bounds
    }

    /// Merge `update` and clamp every field. Non-finite values are ignored.
    pub fn set(&mut self, update: CalibrationUpdate) -> Calibration {
        if let Some(scale) = update.scale.filter(|v| v.is_finite()) {
            self.current.scale = self.bounds.clamp_scale(scale);
        }
        if let Some(dx) = update.offset_x.filter(|v| v.is_finite()) {
            self.current.offset_x = self.bounds.clamp_offset(dx);
        }
        if let Some(dy) = update.offset_y.filter(|v| v.is_finite()) {
            self.current.offset_y = self.bounds.clamp_offset(dy);
        }
        self.current
    }

    /// Step adjustment for +/- buttons
    pub fn nudge(&mut self, d_scale: f32, d_x: f32, d_y: f32) -> Calibration {
        let cur = self.current;
        self.set(CalibrationUpdate {
            scale: Some(cur.scale + d_scale),
            offset_x: Some(cur.offset_x + d_x),
            offset_y: Some(cur.offset_y + d_y),
        })
    }

    pub fn reset(&mut self) -> Calibration {
        self.current = Calibration::IDENTITY;
        self.current
    }
}

impl Default for CalibrationController {
    fn default() -> Self {
        Self::new(CalibrationBounds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_clamps_scale() {
        let mut ctl = CalibrationController::default();
        assert_eq!(ctl.set(CalibrationUpdate { scale: Some(5.0), ..Default::default() }).scale, 1.5);
        assert_eq!(ctl.set(CalibrationUpdate { scale: Some(0.1), ..Default::default() }).scale, 0.5);
    }

    #[test]
    fn test_partial_update_merges() {
        let mut ctl = CalibrationController::default();
        ctl.set(CalibrationUpdate { offset_x: Some(12.0), ..Default::default() });
        let cal = ctl.set(CalibrationUpdate { offset_y: Some(-80.0), ..Default::default() });
        assert_eq!(cal, Calibration { scale: 1.0, offset_x: 12.0, offset_y: -50.0 });
    }

    #[test]
    fn test_non_finite_ignored() {
        let mut ctl = CalibrationController::default();
        ctl.set(CalibrationUpdate { scale: Some(1.2), ..Default::default() });
        let cal = ctl.set(CalibrationUpdate { scale: Some(f32::NAN), offset_x: Some(f32::INFINITY), ..Default::default() });
        assert_eq!(cal.scale, 1.2);
        assert_eq!(cal.offset_x, 0.0);
    }

    #[test]
    fn test_nudge_stays_in_bounds() {
        let mut ctl = CalibrationController::default();
        for _ in 0..20 {
            ctl.nudge(0.1, 5.0, -5.0);
        }
        assert_eq!(ctl.get(), Calibration { scale: 1.5, offset_x: 50.0, offset_y: -50.0 });
    }

    #[test]
    fn test_swapped_bounds_are_sanitized() {
        let ctl = CalibrationController::new(CalibrationBounds { min_scale: 2.0, max_scale: 0.8, max_offset: -10.0 });
        let b = ctl.bounds();
        assert_eq!((b.min_scale, b.max_scale, b.max_offset), (0.8, 2.0, 10.0));
    }

    proptest! {
        #[test]
        fn prop_reset_always_identity(scale in -10.0f32..10.0, dx in -500.0f32..500.0, dy in -500.0f32..500.0) {
            let mut ctl = CalibrationController::default();
            ctl.set(CalibrationUpdate { scale: Some(scale), offset_x: Some(dx), offset_y: Some(dy) });
            prop_assert_eq!(ctl.reset(), Calibration { scale: 1.0, offset_x: 0.0, offset_y: 0.0 });
            prop_assert_eq!(ctl.get(), Calibration::IDENTITY);
        }

        #[test]
        fn prop_set_stays_within_bounds(scale in -100.0f32..100.0, dx in -1e4f32..1e4, dy in -1e4f32..1e4) {
            let mut ctl = CalibrationController::default();
            let cal = ctl.set(CalibrationUpdate { scale: Some(scale), offset_x: Some(dx), offset_y: Some(dy) });
            prop_assert!((0.5..=1.5).contains(&cal.scale));
            prop_assert!((-50.0..=50.0).contains(&cal.offset_x));
            prop_assert!((-50.0..=50.0).contains(&cal.offset_y));
        }
    }
}

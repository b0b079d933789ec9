//! One Euro Filter - adaptive low-pass filter for overlay jitter
//!
//! Smooth when the subject is still (kills landmark shimmer on the jewelry),
//! responsive when they move. Applied on top of the placement output, only
//! between consecutive tracked frames.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::engine::{OverlayTransform, Placement};

/// Filter tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmoothingConfig {
    pub enabled: bool,
    /// Minimum cutoff frequency (Hz) - lower = smoother at rest
    pub min_cutoff: f32,
    /// Speed coefficient - higher = less lag during fast motion
    pub beta: f32,
    /// Derivative cutoff frequency (Hz)
    pub d_cutoff: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_cutoff: 1.2,
            beta: 0.02,
            d_cutoff: 1.0,
        }
    }
}

/// Adaptive low-pass filter for one scalar
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    min_cutoff: f32,
    beta: f32,
    d_cutoff: f32,

    // State
    x_prev: f32,
    dx_prev: f32,
    t_prev: f64,
    initialized: bool,
}

impl OneEuroFilter {
    pub fn new(min_cutoff: f32, beta: f32, d_cutoff: f32) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff,
            x_prev: 0.0,
            dx_prev: 0.0,
            t_prev: 0.0,
            initialized: false,
        }
    }

    fn smoothing_factor(t_e: f32, cutoff: f32) -> f32 {
        let r = 2.0 * PI * cutoff * t_e;
        r / (r + 1.0)
    }

    /// Filter a single value
    ///
    /// - `t`: timestamp in seconds
    /// - `x`: raw input value
    pub fn filter(&mut self, t: f64, x: f32) -> f32 {
        if !self.initialized {
            self.x_prev = x;
            self.dx_prev = 0.0;
            self.t_prev = t;
            self.initialized = true;
            return x;
        }

        let t_e = (t - self.t_prev) as f32;
        if t_e <= 0.0 {
            return self.x_prev;
        }

        // 1. Estimate derivative
        let a_d = Self::smoothing_factor(t_e, self.d_cutoff);
        let dx = (x - self.x_prev) / t_e;
        let dx_hat = a_d * dx + (1.0 - a_d) * self.dx_prev;

        // 2. Adaptive cutoff
        let cutoff = self.min_cutoff + self.beta * dx_hat.abs();
        let a = Self::smoothing_factor(t_e, cutoff);

        // 3. Apply filter
        let x_hat = a * x + (1.0 - a) * self.x_prev;

        self.x_prev = x_hat;
        self.dx_prev = dx_hat;
        self.t_prev = t;

        x_hat
    }

    pub fn last(&self) -> Option<f32> {
        self.initialized.then_some(self.x_prev)
    }

    pub fn reset(&mut self) {
        self.initialized = false;
    }
}

/// Wrap an angle difference into [-180, 180)
fn wrap_degrees(d: f32) -> f32 {
    (d + 180.0).rem_euclid(360.0) - 180.0
}

/// Filters for the four channels of one overlay
#[derive(Debug, Clone)]
struct ChannelFilters {
    x: OneEuroFilter,
    y: OneEuroFilter,
    rotation: OneEuroFilter,
    scale: OneEuroFilter,
}

impl ChannelFilters {
    fn new(cfg: &SmoothingConfig) -> Self {
        let f = || OneEuroFilter::new(cfg.min_cutoff, cfg.beta, cfg.d_cutoff);
        Self { x: f(), y: f(), rotation: f(), scale: f() }
    }

    fn filter(&mut self, t: f64, raw: OverlayTransform) -> OverlayTransform {
        // Unwrap so 179 -> -179 is a 2 degree step, not 358
        let rotation_in = match self.rotation.last() {
            Some(prev) => prev + wrap_degrees(raw.rotation_deg - prev),
            None => raw.rotation_deg,
        };
        OverlayTransform {
            x: self.x.filter(t, raw.x),
            y: self.y.filter(t, raw.y),
            rotation_deg: self.rotation.filter(t, rotation_in),
            scale: self.scale.filter(t, raw.scale),
        }
    }

    fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.rotation.reset();
        self.scale.reset();
    }
}

/// Smooths successive placements; pass-through when disabled
#[derive(Debug, Clone)]
pub struct TransformSmoother {
    enabled: bool,
    channels: [ChannelFilters; 2],
}

impl TransformSmoother {
    pub fn new(cfg: &SmoothingConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            channels: [ChannelFilters::new(cfg), ChannelFilters::new(cfg)],
        }
    }

    /// Smooth `raw` observed at `now_ms`
    pub fn apply(&mut self, now_ms: f64, raw: Placement) -> Placement {
        if !self.enabled {
            return raw;
        }
        let t = now_ms / 1000.0;
        match raw {
            Placement::Single(tr) => Placement::Single(self.channels[0].filter(t, tr)),
            Placement::Pair(mut pair) => {
                pair.left = self.channels[0].filter(t, pair.left);
                pair.right = self.channels[1].filter(t, pair.right);
                Placement::Pair(pair)
            }
        }
    }

    /// Forget history; the next placement passes through untouched
    pub fn reset(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tr(x: f32, rot: f32) -> OverlayTransform {
        OverlayTransform { x, y: 0.0, rotation_deg: rot, scale: 1.0 }
    }

    #[test]
    fn test_first_sample_passes_through() {
        let mut f = OneEuroFilter::new(1.0, 0.0, 1.0);
        assert_eq!(f.filter(0.0, 42.0), 42.0);
    }

    #[test]
    fn test_filter_lags_step_input() {
        let mut f = OneEuroFilter::new(1.0, 0.0, 1.0);
        f.filter(0.0, 0.0);
        let out = f.filter(1.0 / 30.0, 100.0);
        assert!(out > 0.0 && out < 100.0);
    }

    #[test]
    fn test_non_increasing_time_holds_value() {
        let mut f = OneEuroFilter::new(1.0, 0.0, 1.0);
        f.filter(1.0, 5.0);
        assert_eq!(f.filter(1.0, 50.0), 5.0);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_relative_eq!(wrap_degrees(358.0), -2.0);
        assert_relative_eq!(wrap_degrees(-190.0), 170.0);
        assert_relative_eq!(wrap_degrees(10.0), 10.0);
    }

    #[test]
    fn test_rotation_unwrapped_across_seam() {
        let mut s = TransformSmoother::new(&SmoothingConfig::default());
        s.apply(0.0, Placement::Single(tr(0.0, 179.0)));
        let Placement::Single(out) = s.apply(33.0, Placement::Single(tr(0.0, -179.0))) else {
            panic!("expected single");
        };
        // Stays near the seam instead of swinging through zero
        assert!(out.rotation_deg > 178.0 && out.rotation_deg < 182.0, "{}", out.rotation_deg);
    }

    #[test]
    fn test_disabled_is_identity() {
        let cfg = SmoothingConfig { enabled: false, ..Default::default() };
        let mut s = TransformSmoother::new(&cfg);
        s.apply(0.0, Placement::Single(tr(0.0, 0.0)));
        assert_eq!(s.apply(33.0, Placement::Single(tr(90.0, 10.0))), Placement::Single(tr(90.0, 10.0)));
    }

    #[test]
    fn test_reset_snaps_to_next_sample() {
        let mut s = TransformSmoother::new(&SmoothingConfig::default());
        s.apply(0.0, Placement::Single(tr(0.0, 0.0)));
        s.reset();
        assert_eq!(s.apply(33.0, Placement::Single(tr(250.0, 5.0))), Placement::Single(tr(250.0, 5.0)));
    }
}

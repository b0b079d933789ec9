//! Tracking hold - bridge short tracking dropouts
//!
//! When the landmark model misses a frame, keep showing the last good
//! placement for a bounded number of frames while fading it out, then hide.
//! A fresh placement always replaces the held one immediately.

use serde::{Deserialize, Serialize};

use crate::placement::Placement;

/// Longest accepted hold window (~10s at 30 Hz)
pub const MAX_HOLD_FRAMES: u32 = 300;

/// Hold window tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoldConfig {
    /// Frames to keep the last placement after tracking drops out
    pub hold_frames: u32,
    /// Fade opacity over the hold window instead of holding at full
    pub fade: bool,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            hold_frames: 8, // ~270ms at 30 Hz
            fade: true,
        }
    }
}

/// What to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldDecision {
    Show {
        placement: Placement,
        opacity: f32,
        /// Placement came from this frame's landmarks
        fresh: bool,
    },
    Hide,
}

/// Last-known-good placement plus the gap counter
#[derive(Debug, Clone)]
pub struct TrackingHold {
    last: Option<Placement>,
    missed: u32,
    config: HoldConfig,
}

impl TrackingHold {
    pub fn new(config: HoldConfig) -> Self {
        Self {
            last: None,
            missed: 0,
            config,
        }
    }

    /// Frames missed since the last fresh placement
    pub fn missed(&self) -> u32 {
        self.missed
    }

    /// True when the next fresh placement follows a gap (or nothing at all)
    pub fn after_gap(&self) -> bool {
        self.last.is_none() || self.missed > 0
    }

    /// Feed this frame's placement (or its absence)
    pub fn observe(&mut self, fresh: Option<Placement>) -> HoldDecision {
        if let Some(placement) = fresh {
            self.last = Some(placement);
            self.missed = 0;
            return HoldDecision::Show {
                placement,
                opacity: 1.0,
                fresh: true,
            };
        }

        let Some(placement) = self.last else {
            return HoldDecision::Hide;
        };

        self.missed = self.missed.saturating_add(1);
        if self.missed > self.config.hold_frames {
            // Never keep a placement past the window
            self.last = None;
            return HoldDecision::Hide;
        }

        let opacity = if self.config.fade {
            1.0 - self.missed as f32 / (self.config.hold_frames as f32 + 1.0)
        } else {
            1.0
        };
        HoldDecision::Show {
            placement,
            opacity,
            fresh: false,
        }
    }

    pub fn clear(&mut self) {
        self.last = None;
        self.missed = 0;
    }
}

impl Default for TrackingHold {
    fn default() -> Self {
        Self::new(HoldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::OverlayTransform;

    fn at(x: f32) -> Placement {
        Placement::Single(OverlayTransform { x, y: 0.0, rotation_deg: 0.0, scale: 1.0 })
    }

    #[test]
    fn test_nothing_to_hold() {
        let mut hold = TrackingHold::default();
        assert_eq!(hold.observe(None), HoldDecision::Hide);
    }

    #[test]
    fn test_fades_then_hides() {
        let mut hold = TrackingHold::new(HoldConfig { hold_frames: 3, fade: true });
        hold.observe(Some(at(10.0)));

        let mut last_opacity = 1.0;
        for _ in 0..3 {
            match hold.observe(None) {
                HoldDecision::Show { placement, opacity, fresh } => {
                    assert_eq!(placement, at(10.0));
                    assert!(!fresh);
                    assert!(opacity < last_opacity && opacity > 0.0);
                    last_opacity = opacity;
                }
                HoldDecision::Hide => panic!("hidden inside hold window"),
            }
        }
        assert_eq!(hold.observe(None), HoldDecision::Hide);
        // Stays hidden; the stale placement is gone
        assert_eq!(hold.observe(None), HoldDecision::Hide);
    }

    #[test]
    fn test_fresh_snaps_after_gap() {
        let mut hold = TrackingHold::new(HoldConfig { hold_frames: 5, fade: true });
        hold.observe(Some(at(10.0)));
        for _ in 0..3 {
            hold.observe(None);
        }
        assert!(hold.after_gap());
        assert_eq!(
            hold.observe(Some(at(99.0))),
            HoldDecision::Show { placement: at(99.0), opacity: 1.0, fresh: true }
        );
        assert!(!hold.after_gap());
    }

    #[test]
    fn test_zero_window_hides_immediately() {
        let mut hold = TrackingHold::new(HoldConfig { hold_frames: 0, fade: true });
        hold.observe(Some(at(1.0)));
        assert_eq!(hold.observe(None), HoldDecision::Hide);
    }

    #[test]
    fn test_huge_window_fades_without_overflow() {
        let mut hold = TrackingHold::new(HoldConfig { hold_frames: u32::MAX, fade: true });
        hold.observe(Some(at(1.0)));
        match hold.observe(None) {
            HoldDecision::Show { opacity, .. } => assert!(opacity.is_finite() && opacity > 0.0 && opacity <= 1.0),
            HoldDecision::Hide => panic!("hidden inside hold window"),
        }
    }

    #[test]
    fn test_no_fade_holds_full_opacity() {
        let mut hold = TrackingHold::new(HoldConfig { hold_frames: 2, fade: false });
        hold.observe(Some(at(1.0)));
        assert!(matches!(hold.observe(None), HoldDecision::Show { opacity, .. } if opacity == 1.0));
    }
}

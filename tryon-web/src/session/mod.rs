//! Session module - per-product try-on lifecycle
//!
//! Re-exports only. All logic in submodules.

mod driver;
mod hold;
mod tryon;

pub use driver::SessionDriver;
pub use hold::{HoldConfig, HoldDecision, TrackingHold, MAX_HOLD_FRAMES};
pub use tryon::{FrameOutput, SessionMode, SessionState, TryOnSession};

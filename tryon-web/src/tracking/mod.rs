//! Tracking module - landmark models and the pixel-space mapper
//!
//! Re-exports only. All logic in submodules.

mod landmarks;
mod mapper;
mod provider;

pub use landmarks::{face, hand, Landmark, LandmarkSet, ModelKind};
pub use mapper::{required_len, to_pixels, AnchorPoints, Viewport};
pub use provider::{LandmarkModel, LandmarkProvider, ModelHandle, ModelLoader, UnavailableLoader};

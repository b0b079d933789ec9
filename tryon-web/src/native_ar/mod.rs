//! Native AR module - hardware AR viewer delegation
//!
//! Re-exports only. All logic in submodules.

mod viewer;

pub use viewer::{ArMode, NativeArBridge, ViewerConfig, ViewerOptions};

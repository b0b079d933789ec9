//! Try-On Web - landmark-anchored AR jewelry overlay engine
//!
//! Entry point for WASM module. Only contains:
//! - Module declarations
//! - wasm_bindgen entry points that delegate to submodules
//!
//! Everything outside `bridge` is plain Rust and runs natively in tests.

pub mod asset;
pub mod config;
pub mod error;
pub mod logging;
pub mod native_ar;
pub mod placement;
pub mod platform;
pub mod session;
pub mod share;
pub mod tracking;

mod bridge;

use wasm_bindgen::prelude::*;

// Re-export wasm_bindgen functions for JS access
pub use bridge::{
    capture_and_share, end_session, get_calibration, mount_native_viewer, nudge_calibration, process_video_frame,
    push_landmarks, register_model_loader, reset_calibration, session_state, set_calibration, start_session,
};
pub use config::EngineConfig;
pub use error::ArError;

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

/// Called automatically when WASM module loads
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Route engine logs to the browser console ("error" ... "trace", "off")
#[wasm_bindgen]
pub fn init_logging(level: &str) -> Result<(), JsValue> {
    logging::init_with_level(logging::parse_level(level)).map_err(|e| JsValue::from_str(&e.to_string()))?;
    log::info!("Try-on engine {} ready", env!("CARGO_PKG_VERSION"));
    Ok(())
}

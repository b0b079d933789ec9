//! Bridge module - JS ↔ Rust communication
//!
//! All #[wasm_bindgen] entry points live here.
//! Re-exports only in mod.rs, logic in submodules.

mod capture;
mod models;
mod native;
mod session;
mod share;

pub use models::register_model_loader;
pub use native::mount_native_viewer;
pub use session::{
    end_session, get_calibration, nudge_calibration, process_video_frame, push_landmarks, reset_calibration,
    session_state, set_calibration, start_session,
};
pub use share::capture_and_share;

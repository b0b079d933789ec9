//! Session storage and JS bridge
//!
//! One active try-on session at a time. The landmark provider outlives
//! sessions so model weights load once per page.

use std::cell::RefCell;
use std::rc::Rc;

use log::{error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

use super::models::{JsModelLoader, VideoFrame};
use crate::asset::AssetReference;
use crate::config::EngineConfig;
use crate::error::ArError;
use crate::native_ar::ViewerConfig;
use crate::placement::{Calibration, CalibrationUpdate, Category};
use crate::platform::PlatformCapabilities;
use crate::session::{SessionDriver, SessionMode, SessionState, TryOnSession};
use crate::share::ShareConfig;
use crate::tracking::{LandmarkProvider, LandmarkSet, ModelKind};

// ============================================================================
// STORAGE
// ============================================================================

struct ActiveSession {
    driver: Rc<SessionDriver<VideoFrame>>,
    config: EngineConfig,
}

/// Provider plus whether it was built for a tracking-capable platform
struct SharedProvider {
    tracking: bool,
    provider: Rc<LandmarkProvider<VideoFrame>>,
}

// Thread-local storage (WASM is single-threaded)
thread_local! {
    static PROVIDER: RefCell<Option<SharedProvider>> = RefCell::new(None);
    static ACTIVE: RefCell<Option<ActiveSession>> = RefCell::new(None);
}

/// Summary handed back from `start_session`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    category: Category,
    state: SessionState,
    /// Present when the session runs in the native viewer
    native_viewer: Option<ViewerConfig>,
    calibration: Calibration,
}

// ============================================================================
// WASM-BINDGEN ENTRY POINTS
// ============================================================================

/// Start a try-on session, replacing any active one.
///
/// `asset` is an image URL string or `{ imageUrl, modelUrl?, iosModelUrl?, posterUrl? }`.
/// `caps` and `config` may be objects, JSON strings, or omitted.
/// Loads the landmark model for overlay sessions before resolving.
#[wasm_bindgen]
pub async fn start_session(category: String, asset: JsValue, caps: JsValue, config: JsValue) -> Result<JsValue, JsValue> {
    let category = parse_category(&category)?;
    let asset = match asset.as_string() {
        Some(url) => AssetReference::image(url),
        None => serde_wasm_bindgen::from_value(asset).map_err(ArError::from)?,
    };
    let caps: PlatformCapabilities = parse_or_default(caps)?;
    let config = parse_or_default::<EngineConfig>(config)?.validated()?;

    end_session();

    let session = TryOnSession::start(category, asset, &caps, &config);
    let driver = Rc::new(SessionDriver::new(provider_for(&caps), session));
    ACTIVE.with(|a| {
        *a.borrow_mut() = Some(ActiveSession {
            driver: Rc::clone(&driver),
            config,
        })
    });

    if let Err(err) = driver.prepare().await {
        error!("Try-on unavailable: {}", err);
    }
    to_js(&session_info(&driver))
}

/// Run the landmark model on the current video frame.
///
/// Resolves to a frame output, or `null` when the frame was dropped.
#[wasm_bindgen]
pub async fn process_video_frame(
    video: HtmlVideoElement,
    timestamp_ms: f64,
    width: f32,
    height: f32,
) -> Result<JsValue, JsValue> {
    let Some(driver) = active_driver() else {
        return Ok(JsValue::NULL);
    };
    let frame = VideoFrame { video, timestamp_ms };
    match driver.tick(&frame, width, height, timestamp_ms).await {
        Some(output) => to_js(&output),
        None => Ok(JsValue::NULL),
    }
}

/// Feed landmarks computed on the JS side (flat `[x, y, z, ...]`, empty = none)
#[wasm_bindgen]
pub fn push_landmarks(kind: &str, flat: &[f32], width: f32, height: f32, now_ms: f64) -> Result<JsValue, JsValue> {
    let kind = ModelKind::parse(kind).ok_or_else(|| ArError::Config(format!("unknown model kind '{}'", kind)))?;
    let Some(driver) = active_driver() else {
        return Ok(JsValue::NULL);
    };
    let set = (flat.len() >= 3).then(|| LandmarkSet::from_flat(kind, flat));
    to_js(&driver.push(set.as_ref(), width, height, now_ms))
}

/// Merge a partial `{ scale?, offsetX?, offsetY? }`; returns the clamped result
#[wasm_bindgen]
pub fn set_calibration(partial: JsValue) -> Result<JsValue, JsValue> {
    let update: CalibrationUpdate = parse_or_default(partial)?;
    let calibration = with_session(|s| s.set_calibration(update)).unwrap_or_default();
    to_js(&calibration)
}

/// Step the calibration by deltas (for +/- buttons)
#[wasm_bindgen]
pub fn nudge_calibration(d_scale: f32, d_x: f32, d_y: f32) -> Result<JsValue, JsValue> {
    let calibration = with_session(|s| s.nudge_calibration(d_scale, d_x, d_y)).unwrap_or_default();
    to_js(&calibration)
}

#[wasm_bindgen]
pub fn reset_calibration() -> Result<JsValue, JsValue> {
    let calibration = with_session(|s| s.reset_calibration()).unwrap_or_default();
    to_js(&calibration)
}

#[wasm_bindgen]
pub fn get_calibration() -> Result<JsValue, JsValue> {
    let calibration = with_session(|s| s.calibration()).unwrap_or_default();
    to_js(&calibration)
}

/// Current session state, or `null` without a session
#[wasm_bindgen]
pub fn session_state() -> Result<JsValue, JsValue> {
    match with_session(|s| s.state().clone()) {
        Some(state) => to_js(&state),
        None => Ok(JsValue::NULL),
    }
}

/// End the active session and release its model handle
#[wasm_bindgen]
pub fn end_session() {
    if let Some(active) = ACTIVE.with(|a| a.borrow_mut().take()) {
        active.driver.end();
    }
}

// ============================================================================
// INTERNAL API (no wasm_bindgen)
// ============================================================================

/// Share settings of the active session (defaults without one)
pub(crate) fn share_config() -> ShareConfig {
    ACTIVE.with(|a| a.borrow().as_ref().map(|s| s.config.share.clone())).unwrap_or_default()
}

/// Viewer configuration when the active session runs natively
pub(crate) fn native_viewer() -> Option<ViewerConfig> {
    with_session(|s| match s.mode() {
        SessionMode::NativeViewer(viewer) => Some(viewer.clone()),
        SessionMode::Overlay => None,
    })
    .flatten()
}

/// Drop the page-wide provider; the next session builds a fresh one
pub(crate) fn forget_provider() {
    if let Some(shared) = PROVIDER.with(|p| p.borrow_mut().take()) {
        shared.provider.teardown();
    }
}

fn active_driver() -> Option<Rc<SessionDriver<VideoFrame>>> {
    ACTIVE.with(|a| a.borrow().as_ref().map(|s| Rc::clone(&s.driver)))
}

fn with_session<R>(f: impl FnOnce(&mut TryOnSession<VideoFrame>) -> R) -> Option<R> {
    active_driver().map(|driver| driver.with_session(f))
}

/// Reuse the page-wide provider unless tracking support changed
fn provider_for(caps: &PlatformCapabilities) -> Rc<LandmarkProvider<VideoFrame>> {
    PROVIDER.with(|p| {
        let mut slot = p.borrow_mut();
        if let Some(shared) = slot.as_ref().filter(|s| s.tracking == caps.supports_tracking()) {
            return Rc::clone(&shared.provider);
        }
        info!("Creating landmark provider (tracking: {})", caps.supports_tracking());
        let provider = Rc::new(LandmarkProvider::for_capabilities(caps, Rc::new(JsModelLoader)));
        *slot = Some(SharedProvider {
            tracking: caps.supports_tracking(),
            provider: Rc::clone(&provider),
        });
        provider
    })
}

fn session_info(driver: &SessionDriver<VideoFrame>) -> SessionInfo {
    driver.with_session(|s| SessionInfo {
        category: s.category(),
        state: s.state().clone(),
        native_viewer: match s.mode() {
            SessionMode::NativeViewer(viewer) => Some(viewer.clone()),
            SessionMode::Overlay => None,
        },
        calibration: s.calibration(),
    })
}

fn parse_category(name: &str) -> Result<Category, ArError> {
    Category::parse(name).ok_or_else(|| {
        let known: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        ArError::Config(format!("unsupported category '{}' (expected one of {})", name, known.join(", ")))
    })
}

/// Accept a JS object, a JSON string, or nothing
fn parse_or_default<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, ArError> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    if let Some(json) = value.as_string() {
        return Ok(serde_json::from_str(&json)?);
    }
    Ok(serde_wasm_bindgen::from_value(value)?)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    Ok(serde_wasm_bindgen::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("Earrings").unwrap(), Category::Earrings);
        match parse_category("anklet") {
            Err(ArError::Config(msg)) => assert!(msg.contains("earrings, necklace, ring")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}

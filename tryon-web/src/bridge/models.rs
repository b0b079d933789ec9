//! JS-backed landmark models
//!
//! The landmark runtime (MediaPipe tasks) lives in JavaScript. The host
//! registers one async factory per model kind:
//!
//! ```js
//! register_model_loader("face", async () => ({
//!   detect: (video, timestampMs) => Float32Array | null, // or a Promise of it
//!   reset: () => {},                                    // optional
//! }));
//! ```
//!
//! `detect` returns landmarks flattened as `[x0, y0, z0, x1, ...]`.

use std::cell::RefCell;
use std::collections::HashMap;

use futures::future::{self, FutureExt, LocalBoxFuture};
use js_sys::{Float32Array, Function, Promise, Reflect};
use log::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

use crate::error::{describe_js, ArError};
use crate::tracking::{LandmarkModel, LandmarkSet, ModelKind, ModelLoader};

/// One camera frame handed to a JS detector
pub struct VideoFrame {
    pub video: HtmlVideoElement,
    pub timestamp_ms: f64,
}

// Thread-local storage (WASM is single-threaded)
thread_local! {
    static FACTORIES: RefCell<HashMap<ModelKind, Function>> = RefCell::new(HashMap::new());
}

// ============================================================================
// WASM-BINDGEN ENTRY POINTS
// ============================================================================

/// Register the async factory that builds the detector for `kind`
#[wasm_bindgen]
pub fn register_model_loader(kind: &str, factory: Function) -> Result<(), JsValue> {
    let kind = ModelKind::parse(kind).ok_or_else(|| ArError::Config(format!("unknown model kind '{}'", kind)))?;
    FACTORIES.with(|f| f.borrow_mut().insert(kind, factory));
    // Memoized loads (and failures) belong to the previous factory
    super::session::forget_provider();
    info!("Model loader registered for {}", kind);
    Ok(())
}

// ============================================================================
// LOADER / MODEL
// ============================================================================

/// Builds models from the registered JS factories
pub struct JsModelLoader;

impl ModelLoader<VideoFrame> for JsModelLoader {
    fn load(&self, kind: ModelKind) -> LocalBoxFuture<'static, Result<Box<dyn LandmarkModel<VideoFrame>>, ArError>> {
        let factory = FACTORIES.with(|f| f.borrow().get(&kind).cloned());
        let Some(factory) = factory else {
            return future::ready(Err(ArError::ModelLoad {
                kind,
                reason: "no loader registered".into(),
            }))
            .boxed_local();
        };

        async move {
            let load_err = |e: JsValue| ArError::ModelLoad { kind, reason: describe_js(&e) };
            let detector = factory.call0(&JsValue::NULL).map_err(load_err)?;
            let detector = resolve(detector).await.map_err(load_err)?;
            if detector.is_null() || detector.is_undefined() {
                return Err(ArError::ModelLoad {
                    kind,
                    reason: "factory resolved to nothing".into(),
                });
            }
            let model: Box<dyn LandmarkModel<VideoFrame>> = Box::new(JsLandmarkModel { kind, detector });
            Ok(model)
        }
        .boxed_local()
    }
}

struct JsLandmarkModel {
    kind: ModelKind,
    detector: JsValue,
}

impl LandmarkModel<VideoFrame> for JsLandmarkModel {
    fn detect<'a>(&'a mut self, frame: &'a VideoFrame) -> LocalBoxFuture<'a, Result<Option<LandmarkSet>, ArError>> {
        async move {
            let detect = method(&self.detector, "detect")?
                .ok_or_else(|| ArError::Js(format!("{} detector has no detect()", self.kind)))?;
            let out = detect
                .call2(&self.detector, frame.video.as_ref(), &JsValue::from_f64(frame.timestamp_ms))
                .map_err(|e| ArError::Js(describe_js(&e)))?;
            let out = resolve(out).await.map_err(|e| ArError::Js(describe_js(&e)))?;
            Ok(landmarks_from_js(self.kind, &out))
        }
        .boxed_local()
    }

    fn release(&mut self) {
        match method(&self.detector, "reset") {
            Ok(Some(reset)) => {
                if let Err(e) = reset.call0(&self.detector) {
                    warn!("{} detector reset failed: {}", self.kind, describe_js(&e));
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{} detector reset unavailable: {}", self.kind, e),
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Optional method lookup; `Ok(None)` when the property is absent
fn method(target: &JsValue, name: &str) -> Result<Option<Function>, ArError> {
    let value = Reflect::get(target, &JsValue::from_str(name)).map_err(|e| ArError::Js(describe_js(&e)))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    value
        .dyn_into::<Function>()
        .map(Some)
        .map_err(|_| ArError::Js(format!("{} is not a function", name)))
}

/// Await `value` if it is a Promise, otherwise pass it through
async fn resolve(value: JsValue) -> Result<JsValue, JsValue> {
    match value.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(value) => Ok(value),
    }
}

fn landmarks_from_js(kind: ModelKind, value: &JsValue) -> Option<LandmarkSet> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let flat = match value.dyn_ref::<Float32Array>() {
        Some(array) => array.to_vec(),
        // Plain arrays of numbers
        None => Float32Array::new(value).to_vec(),
    };
    if flat.len() < 3 {
        return None;
    }
    Some(LandmarkSet::from_flat(kind, &flat))
}

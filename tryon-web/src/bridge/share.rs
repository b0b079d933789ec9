//! Share entry point and the browser-backed share channels

use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlCanvasElement, Window};

use super::capture::CanvasSource;
use super::session::share_config;
use crate::error::describe_js;
use crate::share::{
    capture, CaptureResult, LinkOpener, ShareChain, ShareChannel, ShareMessage, ShareStrategy, StrategyResult,
};

// ============================================================================
// WASM-BINDGEN ENTRY POINTS
// ============================================================================

/// Capture the composited canvas and run the share chain.
///
/// Resolves to `{ status: "shared" | "cancelled" | "failed", detail }`.
/// Rejects only when the canvas cannot be read.
#[wasm_bindgen]
pub async fn capture_and_share(
    canvas: HtmlCanvasElement,
    product_name: String,
    page_url: Option<String>,
) -> Result<JsValue, JsValue> {
    let mut config = share_config();
    if page_url.is_some() {
        config.page_url = page_url;
    }

    let captured = capture(&CanvasSource::new(canvas), &product_name, js_sys::Date::now())?;
    let chain = ShareChain::standard(Box::new(NativeShareStrategy), Rc::new(WindowOpener), config);
    let outcome = chain.share(&captured, &product_name).await;
    Ok(serde_wasm_bindgen::to_value(&outcome)?)
}

// ============================================================================
// NATIVE SHARE SHEET
// ============================================================================

/// `navigator.share` with the capture attached as a file when allowed
pub struct NativeShareStrategy;

impl ShareStrategy for NativeShareStrategy {
    fn channel(&self) -> ShareChannel {
        ShareChannel::NativeSheet
    }

    fn attempt<'a>(&'a self, capture: &'a CaptureResult, message: &'a ShareMessage) -> LocalBoxFuture<'a, StrategyResult> {
        native_share(capture, message).boxed_local()
    }
}

async fn native_share(capture: &CaptureResult, message: &ShareMessage) -> StrategyResult {
    let Some(window) = web_sys::window() else {
        return StrategyResult::Unavailable;
    };
    let navigator: JsValue = window.navigator().into();
    let Some(share) = function(&navigator, "share") else {
        return StrategyResult::Unavailable;
    };

    let data = match share_data(&window, &navigator, capture, message) {
        Ok(data) => data,
        Err(e) => return StrategyResult::Failed(describe_js(&e)),
    };

    let pending = match share.call1(&navigator, &data) {
        Ok(pending) => pending,
        Err(e) => return classify_js_error(&e),
    };
    let pending = match pending.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(_) => Ok(JsValue::UNDEFINED),
    };
    match pending {
        Ok(_) => StrategyResult::Succeeded,
        Err(e) => classify_js_error(&e),
    }
}

fn share_data(
    window: &Window,
    navigator: &JsValue,
    capture: &CaptureResult,
    message: &ShareMessage,
) -> Result<JsValue, JsValue> {
    let data = Object::new();
    Reflect::set(&data, &"title".into(), &message.title.as_str().into())?;
    Reflect::set(&data, &"text".into(), &message.text.as_str().into())?;
    if let Some(url) = &message.url {
        Reflect::set(&data, &"url".into(), &url.as_str().into())?;
    }

    match image_file(window, capture) {
        Ok(file) => {
            let files = Array::of1(&file);
            let probe = Object::new();
            Reflect::set(&probe, &"files".into(), &files)?;
            let can_share = function(navigator, "canShare")
                .map(|f| f.call1(navigator, &probe).map(|v| v.is_truthy()).unwrap_or(false))
                .unwrap_or(false);
            if can_share {
                Reflect::set(&data, &"files".into(), &files)?;
            } else {
                debug!("Share sheet cannot take files, sharing text only");
            }
        }
        Err(e) => warn!("Could not attach capture: {}", describe_js(&e)),
    }
    Ok(data.into())
}

/// Decode the capture's data URL into a `File`
fn image_file(window: &Window, capture: &CaptureResult) -> Result<JsValue, JsValue> {
    let payload = capture
        .image
        .data_url
        .split_once(',')
        .map(|(_, payload)| payload)
        .ok_or_else(|| JsValue::from_str("capture is not a data URL"))?;
    let binary = window.atob(payload)?;
    let bytes: Vec<u8> = binary.chars().map(|c| c as u8).collect();

    let parts = Array::of1(&Uint8Array::from(bytes.as_slice()));
    let options = Object::new();
    Reflect::set(&options, &"type".into(), &capture.image.mime_type.as_str().into())?;

    let ctor = Reflect::get(&js_sys::global(), &"File".into())?.dyn_into::<Function>()?;
    let args = Array::of3(&parts, &capture.file_name().into(), &options);
    Reflect::construct(&ctor, &args)
}

fn function(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|v| v.dyn_into::<Function>().ok())
}

fn classify_js_error(err: &JsValue) -> StrategyResult {
    let name = Reflect::get(err, &"name".into()).ok().and_then(|n| n.as_string());
    classify_share_error(name.as_deref(), describe_js(err))
}

/// Map a rejected `navigator.share` to a strategy result by DOMException name
fn classify_share_error(name: Option<&str>, detail: String) -> StrategyResult {
    match name {
        Some("AbortError") => StrategyResult::Cancelled,
        Some("NotSupportedError") => StrategyResult::Unavailable,
        // NotAllowedError (no user gesture), DataError, TypeError, ...
        _ => StrategyResult::Failed(detail),
    }
}

// ============================================================================
// LINK OPENER
// ============================================================================

/// Opens share links in a new browsing context
pub struct WindowOpener;

impl LinkOpener for WindowOpener {
    fn open(&self, url: &str) -> Result<(), String> {
        let window = web_sys::window().ok_or("no window")?;
        match window.open_with_url_and_target(url, "_blank") {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err("popup blocked".to_string()),
            Err(e) => Err(describe_js(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dismissal_is_cancel() {
        assert_eq!(classify_share_error(Some("AbortError"), "dismissed".into()), StrategyResult::Cancelled);
    }

    #[test]
    fn test_unsupported_payload_is_unavailable() {
        assert_eq!(
            classify_share_error(Some("NotSupportedError"), "no".into()),
            StrategyResult::Unavailable
        );
    }

    #[test]
    fn test_other_errors_fail() {
        assert_eq!(
            classify_share_error(Some("NotAllowedError"), "no gesture".into()),
            StrategyResult::Failed("no gesture".into())
        );
        assert_eq!(classify_share_error(None, "boom".into()), StrategyResult::Failed("boom".into()));
    }
}

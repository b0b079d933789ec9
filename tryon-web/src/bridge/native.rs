//! `<model-viewer>` mounting for native AR sessions

use log::info;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement};

use super::session::native_viewer;
use crate::error::ArError;
use crate::native_ar::ViewerConfig;

/// Mount a `<model-viewer>` for the active native session into `container`.
///
/// Resolves to the element, or `null` when the session runs as an overlay.
/// The host page must load the model-viewer web component itself.
#[wasm_bindgen]
pub fn mount_native_viewer(container: HtmlElement) -> Result<JsValue, JsValue> {
    let Some(viewer) = native_viewer() else {
        return Ok(JsValue::NULL);
    };
    let document = container
        .owner_document()
        .ok_or_else(|| ArError::Js("container is not attached to a document".into()))?;

    let element = build_element(&document, &viewer)?;
    container.append_child(&element)?;
    info!("Native viewer mounted ({} modes)", viewer.ar_modes.len());
    Ok(element.into())
}

fn build_element(document: &Document, viewer: &ViewerConfig) -> Result<Element, JsValue> {
    let element = document.create_element("model-viewer")?;
    for (name, value) in viewer.attributes() {
        element.set_attribute(name, &value)?;
    }
    Ok(element)
}

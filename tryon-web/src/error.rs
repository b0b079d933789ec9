//! Error taxonomy for the try-on engine
//!
//! Only conditions that end a session or an on-demand action are errors.
//! Tracking gaps and share cancellation are ordinary values elsewhere.

use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::tracking::ModelKind;

/// Errors surfaced to the hosting UI
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArError {
    /// Camera, GPU or model runtime missing. Fatal for the session.
    #[error("AR unavailable: {0}")]
    Capability(String),

    /// A landmark model failed to load
    #[error("failed to load {kind} landmark model: {reason}")]
    ModelLoad { kind: ModelKind, reason: String },

    /// The composite could not be read back as an image
    #[error("capture failed: {0}")]
    Capture(String),

    /// Every share strategy failed
    #[error("share failed: {0}")]
    Share(String),

    /// Malformed engine configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Unexpected value crossing the JS boundary
    #[error("javascript error: {0}")]
    Js(String),
}

impl ArError {
    /// True for errors that terminate the try-on session
    pub fn is_fatal(&self) -> bool {
        matches!(self, ArError::Capability(_) | ArError::ModelLoad { .. })
    }
}

impl From<serde_json::Error> for ArError {
    fn from(err: serde_json::Error) -> Self {
        ArError::Config(err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for ArError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        ArError::Js(err.to_string())
    }
}

impl From<ArError> for JsValue {
    fn from(err: ArError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Render a thrown JS value as text for logging and error payloads
pub(crate) fn describe_js(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

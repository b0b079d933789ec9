//! Share fallback chain
//!
//! Platform share APIs fail in several distinct ways. Each strategy reports
//! a typed result and the chain decides, from an explicit ordered list, what
//! runs next:
//!
//! 1. native share sheet with the image attached
//! 2. messaging-app deep link (text only), when the sheet is unavailable
//! 3. social-app landing page, when the sheet failed for any other reason
//!
//! A user dismissing the sheet is a successful no-op and stops the chain.

use std::fmt;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::capture::CaptureResult;

// ============================================================================
// CONFIG
// ============================================================================

/// Share text and fallback targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShareConfig {
    /// `{product}` is replaced with the product name
    pub message_template: String,
    /// Product page appended to the message, if known
    pub page_url: Option<String>,
    /// Messaging deep link; the message goes in the `text` query parameter
    pub messaging_url: String,
    /// Social landing page opened as the last resort
    pub social_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            message_template: "Check out this {product} I tried on virtually!".to_string(),
            page_url: None,
            messaging_url: "https://wa.me/".to_string(),
            social_url: "https://www.instagram.com/".to_string(),
        }
    }
}

/// Text that accompanies a share
#[derive(Debug, Clone, PartialEq)]
pub struct ShareMessage {
    pub title: String,
    pub text: String,
    pub url: Option<String>,
}

impl ShareMessage {
    pub fn compose(cfg: &ShareConfig, product_name: &str) -> Self {
        let product = product_name.trim();
        let product = if product.is_empty() { "piece" } else { product };
        Self {
            title: product.to_string(),
            text: cfg.message_template.replace("{product}", product),
            url: cfg.page_url.clone().filter(|u| !u.trim().is_empty()),
        }
    }

    /// Message and link as one line, for channels without a url field
    pub fn full_text(&self) -> String {
        match &self.url {
            Some(url) => format!("{} {}", self.text, url),
            None => self.text.clone(),
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Which channel carried the share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShareChannel {
    NativeSheet,
    MessagingLink,
    SocialLanding,
}

impl fmt::Display for ShareChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShareChannel::NativeSheet => "native share sheet",
            ShareChannel::MessagingLink => "messaging link",
            ShareChannel::SocialLanding => "social landing page",
        })
    }
}

/// Result of a single strategy attempt
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyResult {
    Succeeded,
    /// User dismissed the dialog
    Cancelled,
    /// The platform does not offer this channel
    Unavailable,
    Failed(String),
}

/// Final result of a share action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum ShareOutcome {
    Shared(ShareChannel),
    Cancelled,
    Failed(String),
}

// ============================================================================
// STRATEGIES
// ============================================================================

/// One way of sharing a capture
pub trait ShareStrategy {
    fn channel(&self) -> ShareChannel;

    fn attempt<'a>(
        &'a self,
        capture: &'a CaptureResult,
        message: &'a ShareMessage,
    ) -> LocalBoxFuture<'a, StrategyResult>;
}

/// Opens URLs in a new tab/app
pub trait LinkOpener {
    fn open(&self, url: &str) -> Result<(), String>;
}

/// Messaging deep link, e.g. `https://wa.me/?text=...`
pub fn messaging_link(base: &str, message: &ShareMessage) -> Result<String, String> {
    url::Url::parse_with_params(base, &[("text", message.full_text())])
        .map(String::from)
        .map_err(|e| format!("bad messaging url {}: {}", base, e))
}

/// Text-only deep link into a messaging app
pub struct MessagingLinkStrategy {
    base_url: String,
    opener: Rc<dyn LinkOpener>,
}

impl MessagingLinkStrategy {
    pub fn new(base_url: impl Into<String>, opener: Rc<dyn LinkOpener>) -> Self {
        Self { base_url: base_url.into(), opener }
    }
}

impl ShareStrategy for MessagingLinkStrategy {
    fn channel(&self) -> ShareChannel {
        ShareChannel::MessagingLink
    }

    fn attempt<'a>(&'a self, _capture: &'a CaptureResult, message: &'a ShareMessage) -> LocalBoxFuture<'a, StrategyResult> {
        let result = messaging_link(&self.base_url, message)
            .and_then(|link| self.opener.open(&link))
            .map_or_else(StrategyResult::Failed, |_| StrategyResult::Succeeded);
        future::ready(result).boxed_local()
    }
}

/// Social landing page; the user attaches the image by hand
pub struct SocialLandingStrategy {
    url: String,
    opener: Rc<dyn LinkOpener>,
}

impl SocialLandingStrategy {
    pub fn new(url: impl Into<String>, opener: Rc<dyn LinkOpener>) -> Self {
        Self { url: url.into(), opener }
    }
}

impl ShareStrategy for SocialLandingStrategy {
    fn channel(&self) -> ShareChannel {
        ShareChannel::SocialLanding
    }

    fn attempt<'a>(&'a self, _capture: &'a CaptureResult, _message: &'a ShareMessage) -> LocalBoxFuture<'a, StrategyResult> {
        let result = match self.opener.open(&self.url) {
            Ok(()) => StrategyResult::Succeeded,
            Err(reason) => StrategyResult::Failed(reason),
        };
        future::ready(result).boxed_local()
    }
}

// ============================================================================
// CHAIN
// ============================================================================

/// When a chain entry runs, given the previous entry's result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Previous channel does not exist on this platform
    OnUnavailable,
    /// Previous channel exists but errored
    OnFailure,
}

impl Fallback {
    fn matches(&self, previous: &StrategyResult) -> bool {
        matches!(
            (self, previous),
            (Fallback::OnUnavailable, StrategyResult::Unavailable) | (Fallback::OnFailure, StrategyResult::Failed(_))
        )
    }
}

/// Ordered strategies with explicit fallback conditions
pub struct ShareChain {
    first: Box<dyn ShareStrategy>,
    fallbacks: Vec<(Fallback, Box<dyn ShareStrategy>)>,
    config: ShareConfig,
}

impl ShareChain {
    pub fn new(first: Box<dyn ShareStrategy>, config: ShareConfig) -> Self {
        Self {
            first,
            fallbacks: Vec::new(),
            config,
        }
    }

    /// Native sheet, then messaging link when unavailable, then social page on failure
    pub fn standard(native: Box<dyn ShareStrategy>, opener: Rc<dyn LinkOpener>, config: ShareConfig) -> Self {
        let messaging = MessagingLinkStrategy::new(config.messaging_url.clone(), Rc::clone(&opener));
        let social = SocialLandingStrategy::new(config.social_url.clone(), opener);
        Self::new(native, config)
            .then(Fallback::OnUnavailable, Box::new(messaging))
            .then(Fallback::OnFailure, Box::new(social))
    }

    pub fn then(mut self, when: Fallback, strategy: Box<dyn ShareStrategy>) -> Self {
        self.fallbacks.push((when, strategy));
        self
    }

    /// Run the chain for one capture
    pub async fn share(&self, capture: &CaptureResult, product_name: &str) -> ShareOutcome {
        let message = ShareMessage::compose(&self.config, product_name);

        let mut last = self.first.attempt(capture, &message).await;
        if let Some(outcome) = Self::settle(self.first.channel(), &last) {
            return outcome;
        }

        for (when, strategy) in &self.fallbacks {
            if !when.matches(&last) {
                debug!("Skipping {} ({:?} does not apply)", strategy.channel(), when);
                continue;
            }
            warn!("Share falling back to {} after {:?}", strategy.channel(), last);
            last = strategy.attempt(capture, &message).await;
            if let Some(outcome) = Self::settle(strategy.channel(), &last) {
                return outcome;
            }
        }

        match last {
            StrategyResult::Failed(reason) => ShareOutcome::Failed(reason),
            _ => ShareOutcome::Failed("no share channel available".to_string()),
        }
    }

    fn settle(channel: ShareChannel, result: &StrategyResult) -> Option<ShareOutcome> {
        match result {
            StrategyResult::Succeeded => {
                info!("Shared via {}", channel);
                Some(ShareOutcome::Shared(channel))
            }
            StrategyResult::Cancelled => {
                debug!("Share cancelled by user");
                Some(ShareOutcome::Cancelled)
            }
            StrategyResult::Unavailable | StrategyResult::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::capture::tests::png;
    use futures::executor::block_on;
    use std::cell::RefCell;

    struct FakeNative(StrategyResult);

    impl ShareStrategy for FakeNative {
        fn channel(&self) -> ShareChannel {
            ShareChannel::NativeSheet
        }

        fn attempt<'a>(&'a self, _c: &'a CaptureResult, _m: &'a ShareMessage) -> LocalBoxFuture<'a, StrategyResult> {
            future::ready(self.0.clone()).boxed_local()
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: RefCell<Vec<String>>,
        fail: bool,
    }

    impl LinkOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<(), String> {
            self.opened.borrow_mut().push(url.to_string());
            if self.fail {
                Err("popup blocked".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn capture() -> CaptureResult {
        CaptureResult {
            image: png(320, 240),
            product_name: "Ruby Ring".into(),
            captured_at_ms: 0.0,
        }
    }

    fn run(native: StrategyResult, opener: Rc<RecordingOpener>) -> ShareOutcome {
        let chain = ShareChain::standard(Box::new(FakeNative(native)), opener, ShareConfig::default());
        block_on(chain.share(&capture(), "Ruby Ring"))
    }

    #[test]
    fn test_native_success() {
        let opener = Rc::new(RecordingOpener::default());
        assert_eq!(run(StrategyResult::Succeeded, Rc::clone(&opener)), ShareOutcome::Shared(ShareChannel::NativeSheet));
        assert!(opener.opened.borrow().is_empty());
    }

    #[test]
    fn test_cancel_opens_nothing() {
        let opener = Rc::new(RecordingOpener::default());
        assert_eq!(run(StrategyResult::Cancelled, Rc::clone(&opener)), ShareOutcome::Cancelled);
        assert!(opener.opened.borrow().is_empty());
    }

    #[test]
    fn test_unavailable_uses_messaging_link() {
        let opener = Rc::new(RecordingOpener::default());
        let outcome = run(StrategyResult::Unavailable, Rc::clone(&opener));
        assert_eq!(outcome, ShareOutcome::Shared(ShareChannel::MessagingLink));
        let opened = opener.opened.borrow();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].starts_with("https://wa.me/?text="));
        assert!(opened[0].contains("Ruby"));
    }

    #[test]
    fn test_failure_uses_social_landing() {
        let opener = Rc::new(RecordingOpener::default());
        let outcome = run(StrategyResult::Failed("NotAllowedError".into()), Rc::clone(&opener));
        assert_eq!(outcome, ShareOutcome::Shared(ShareChannel::SocialLanding));
        assert_eq!(*opener.opened.borrow(), vec!["https://www.instagram.com/".to_string()]);
    }

    #[test]
    fn test_everything_fails() {
        let opener = Rc::new(RecordingOpener { fail: true, ..Default::default() });
        let outcome = run(StrategyResult::Failed("TypeError".into()), Rc::clone(&opener));
        assert_eq!(outcome, ShareOutcome::Failed("popup blocked".into()));
    }

    #[test]
    fn test_message_composition() {
        let cfg = ShareConfig {
            page_url: Some("https://shop.example/p/42".into()),
            ..Default::default()
        };
        let msg = ShareMessage::compose(&cfg, "Pearl Necklace");
        assert_eq!(msg.text, "Check out this Pearl Necklace I tried on virtually!");
        assert_eq!(msg.full_text(), "Check out this Pearl Necklace I tried on virtually! https://shop.example/p/42");

        let link = messaging_link("https://wa.me/", &msg).unwrap();
        assert!(link.starts_with("https://wa.me/?text=Check+out+this+Pearl+Necklace"));
        assert!(link.contains("https%3A%2F%2Fshop.example%2Fp%2F42"));
    }
}

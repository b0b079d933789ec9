//! Share module - capture the composite and hand it to the platform
//!
//! Re-exports only. All logic in submodules.

mod capture;
mod strategy;

pub use capture::{capture, CaptureResult, CapturedImage, CompositeSource};
pub use strategy::{
    messaging_link, Fallback, LinkOpener, MessagingLinkStrategy, ShareChain, ShareChannel, ShareConfig,
    ShareMessage, ShareOutcome, ShareStrategy, SocialLandingStrategy, StrategyResult,
};

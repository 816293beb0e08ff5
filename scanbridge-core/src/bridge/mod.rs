//! Outbound notifier fired when a scan is created.
//!
//! The notifier asks an external pipeline to run against the scanned
//! account, either through a generic webhook (`bridge` mode) or a GitHub
//! Actions workflow dispatch. Delivery is best effort: [`ScanBridge::trigger`]
//! logs every outcome and never reports failure to its caller.

pub mod client;
pub mod outcome;
pub mod payload;

pub use client::{BridgeError, ScanBridge};
pub use outcome::{BridgeOutcome, SkipReason};
pub use payload::{
    DispatchInputs, DispatchPayload, NotificationPayload, ScanContext,
};

/// `User-Agent` sent with every notification.
pub const USER_AGENT: &str = "prowler-scan-bridge";
/// Media type GitHub expects on REST calls.
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
pub const GITHUB_API_VERSION: &str = "2022-11-28";
pub const GITHUB_API_BASE: &str = "https://api.github.com";

//! # Scan Bridge Core
//!
//! Domain logic connecting scan records to an external CI/CD pipeline.
//!
//! ## Overview
//!
//! - [`bridge`]: best-effort outbound notification fired when a scan is
//!   created (generic webhook or GitHub `workflow_dispatch`)
//! - [`publish`]: the pipeline's status events, their summary projection, and
//!   the file-backed document that remembers the latest one per event name
//! - [`scans`]: the narrow slice of the scan/provider records this service
//!   reads and updates, behind the [`scans::ScanRepository`] port
//! - [`api`]: route constants shared by the server and its clients
//!
//! The two halves never call each other; they are joined only through the
//! external pipeline, which is triggered by [`bridge`] and later reports back
//! through the publish endpoints.

pub mod api;
pub mod bridge;
pub mod publish;
pub mod scans;

pub use bridge::{BridgeOutcome, ScanBridge};
pub use publish::{
    PublishEntry, PublishMeta, PublishState, PublishStateStore,
    extract_summary,
};
pub use scans::{BridgeScan, ProviderRef, ScanRepository, ScanState};

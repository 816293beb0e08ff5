//! Status events published back by the external pipeline.
//!
//! Each event is reduced to a [`PublishEntry`] (who sent it, when, and a
//! filtered summary of its payload) and merged into a single
//! [`PublishState`] document keyed by event name.

pub mod entry;
pub mod selection;
pub mod store;
pub mod summary;

pub use entry::{PublishEntry, PublishMeta, PublishState, UNKNOWN_EVENT};
pub use selection::{pick_summary, region_filter};
pub use store::{PublishStateStore, PublishStoreError};
pub use summary::{SUMMARY_KEYS, extract_summary};

//! Shared configuration library for the scan bridge.
//!
//! Configuration is composed once at start-up from three layers: built-in
//! defaults, an optional `scanbridge.toml`, and the process environment
//! (including a `.env` file when present). The resulting [`Config`] is handed
//! to the server and the outbound notifier instead of either of them reading
//! environment variables on their own.

pub mod constants;
pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader};
pub use models::{
    AccountIdSource, BridgeConfig, BridgeMode, Config, ConfigMetadata,
    DatabaseConfig, PublishConfig, ServerConfig,
};
pub use validation::{ConfigWarning, ConfigWarnings};

use std::{fmt, sync::Arc};

use scanbridge_config::{Config, PublishConfig};
use scanbridge_core::{PublishStateStore, ScanBridge, ScanRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub publish_store: Arc<PublishStateStore>,
    pub scans: Arc<dyn ScanRepository>,
    pub bridge: Arc<ScanBridge>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("publish_state", &self.publish_store.path())
            .field("bridge_enabled", &self.bridge.is_enabled())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        scans: Arc<dyn ScanRepository>,
        bridge: Arc<ScanBridge>,
    ) -> Self {
        let publish_store = Arc::new(PublishStateStore::new(
            config.publish.state_file.clone(),
        ));
        Self {
            config,
            publish_store,
            scans,
            bridge,
        }
    }

    pub fn publish(&self) -> &PublishConfig {
        &self.config.publish
    }
}

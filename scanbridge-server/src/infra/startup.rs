use std::sync::Arc;

use anyhow::{Context, Result};
use scanbridge_config::{Config, DatabaseConfig};
use scanbridge_core::{
    ScanBridge,
    scans::{DetachedScanRepository, ScanRepository},
};
use tracing::{info, warn};

use crate::infra::app_state::AppState;

/// Wire the long-lived services from a loaded configuration.
pub fn wire_app_state(config: Config) -> Result<AppState> {
    let scans = scan_repository(&config.database)?;
    let bridge = ScanBridge::new(config.bridge.clone())
        .context("failed to build scan bridge client")?;

    if bridge.is_enabled() {
        info!(mode = %config.bridge.mode, "scan bridge enabled");
    }

    Ok(AppState::new(Arc::new(config), scans, Arc::new(bridge)))
}

/// Scan repository for the configured database. Without a database URL
/// every scan update fails softly.
pub fn scan_repository(
    database: &DatabaseConfig,
) -> Result<Arc<dyn ScanRepository>> {
    match database.url.as_deref() {
        Some(url) => connect(url),
        None => {
            warn!("DATABASE_URL not set; scan records will not be updated");
            Ok(Arc::new(DetachedScanRepository))
        }
    }
}

#[cfg(feature = "database")]
fn connect(url: &str) -> Result<Arc<dyn ScanRepository>> {
    let repo = scanbridge_core::scans::PostgresScanRepository::connect_lazy(url)
        .context("failed to configure PostgreSQL pool")?;
    Ok(Arc::new(repo))
}

#[cfg(not(feature = "database"))]
fn connect(_url: &str) -> Result<Arc<dyn ScanRepository>> {
    warn!("built without database support; scan records will not be updated");
    Ok(Arc::new(DetachedScanRepository))
}

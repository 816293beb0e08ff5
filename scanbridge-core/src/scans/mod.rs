//! The slice of the host application's scan records this service touches.
//!
//! Scans and providers are owned elsewhere. The notifier reads a scan with
//! its provider when one is created, and the upload endpoint marks a scan
//! completed once its report archive has been stored.

#[cfg(feature = "database")]
pub mod postgres;
pub mod repository;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "database")]
pub use postgres::PostgresScanRepository;
pub use repository::{DetachedScanRepository, ScanRepository, ScanStoreError};

/// Lifecycle states of a scan, using the host application's stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Available,
    Scheduled,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

impl ScanState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Scheduled => "scheduled",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloud account the scan targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRef {
    /// External identifier, e.g. the AWS account id.
    pub uid: String,
    pub alias: String,
}

/// What the notifier needs to know about a freshly created scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeScan {
    pub id: Uuid,
    pub name: Option<String>,
    pub provider_id: Uuid,
    pub provider: Option<ProviderRef>,
}

impl BridgeScan {
    pub fn provider_uid(&self) -> &str {
        self.provider
            .as_ref()
            .map(|p| p.uid.as_str())
            .unwrap_or_default()
    }

    pub fn provider_alias(&self) -> &str {
        self.provider
            .as_ref()
            .map(|p| p.alias.as_str())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_state_uses_stored_value() {
        assert_eq!(ScanState::Completed.as_str(), "completed");
        assert_eq!(
            serde_json::to_value(ScanState::Completed).expect("serializes"),
            serde_json::json!("completed")
        );
    }

    #[test]
    fn missing_provider_reads_as_empty() {
        let scan = BridgeScan {
            id: Uuid::new_v4(),
            name: None,
            provider_id: Uuid::new_v4(),
            provider: None,
        };
        assert_eq!(scan.provider_uid(), "");
        assert_eq!(scan.provider_alias(), "");
    }
}

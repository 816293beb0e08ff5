use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::BridgeScan;

#[derive(Debug, Error)]
pub enum ScanStoreError {
    #[error("invalid scan id `{0}`")]
    InvalidId(String),
    #[error("scan database is not configured")]
    Unavailable,
    #[error("scan database error: {0}")]
    Database(String),
}

#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// Mark a scan completed and point it at its stored report archive.
    ///
    /// The lookup is by id only: scans hidden from normal queries (other
    /// tenants, soft-deleted rows) are updated too. Returns the number of
    /// rows changed; zero is not an error.
    async fn mark_completed(
        &self,
        scan_id: &str,
        output_location: &str,
    ) -> Result<u64, ScanStoreError>;

    /// Load a scan together with its provider.
    async fn find_bridge_scan(
        &self,
        scan_id: Uuid,
    ) -> Result<Option<BridgeScan>, ScanStoreError>;
}

/// Stand-in used when no database is configured. Every call fails with
/// [`ScanStoreError::Unavailable`], which uploads report as `db_error`.
#[derive(Debug, Default, Clone)]
pub struct DetachedScanRepository;

#[async_trait]
impl ScanRepository for DetachedScanRepository {
    async fn mark_completed(
        &self,
        _scan_id: &str,
        _output_location: &str,
    ) -> Result<u64, ScanStoreError> {
        Err(ScanStoreError::Unavailable)
    }

    async fn find_bridge_scan(
        &self,
        _scan_id: Uuid,
    ) -> Result<Option<BridgeScan>, ScanStoreError> {
        Err(ScanStoreError::Unavailable)
    }
}

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use super::{
    BridgeScan, ProviderRef, ScanState,
    repository::{ScanRepository, ScanStoreError},
};

const MAX_CONNECTIONS: u32 = 4;

#[derive(Debug, Clone)]
pub struct PostgresScanRepository {
    pool: PgPool,
}

impl PostgresScanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a repository whose pool connects on first use, so the server
    /// starts even while the database is unreachable.
    pub fn connect_lazy(url: &str) -> Result<Self, ScanStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_lazy(url)
            .map_err(|e| {
                ScanStoreError::Database(format!("invalid database URL: {e}"))
            })?;
        Ok(Self::new(pool))
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<BridgeScan, ScanStoreError> {
        let read = |e: sqlx::Error| {
            ScanStoreError::Database(format!("Failed to read scan row: {e}"))
        };

        let id: Uuid = row.try_get("id").map_err(read)?;
        let name: Option<String> = row.try_get("name").map_err(read)?;
        let provider_id: Uuid = row.try_get("provider_id").map_err(read)?;
        let provider_uid: Option<String> =
            row.try_get("provider_uid").map_err(read)?;
        let provider_alias: Option<String> =
            row.try_get("provider_alias").map_err(read)?;

        Ok(BridgeScan {
            id,
            name,
            provider_id,
            provider: provider_uid.map(|uid| ProviderRef {
                uid,
                alias: provider_alias.unwrap_or_default(),
            }),
        })
    }
}

#[async_trait]
impl ScanRepository for PostgresScanRepository {
    async fn mark_completed(
        &self,
        scan_id: &str,
        output_location: &str,
    ) -> Result<u64, ScanStoreError> {
        let id = Uuid::parse_str(scan_id)
            .map_err(|_| ScanStoreError::InvalidId(scan_id.to_string()))?;

        // No tenant or soft-delete predicate: the pipeline may report on
        // scans the normal managers hide.
        let result = sqlx::query(
            r#"
            UPDATE scans
            SET state = $2,
                output_location = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(ScanState::Completed.as_str())
        .bind(output_location)
        .execute(self.pool())
        .await
        .map_err(|e| {
            ScanStoreError::Database(format!("Failed to update scan {id}: {e}"))
        })?;

        Ok(result.rows_affected())
    }

    async fn find_bridge_scan(
        &self,
        scan_id: Uuid,
    ) -> Result<Option<BridgeScan>, ScanStoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                s.id,
                s.name,
                s.provider_id,
                p.uid AS provider_uid,
                p.alias AS provider_alias
            FROM scans s
            LEFT JOIN providers p ON p.id = s.provider_id
            WHERE s.id = $1
            "#,
        )
        .bind(scan_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            ScanStoreError::Database(format!(
                "Failed to load scan {scan_id}: {e}"
            ))
        })?;

        row.as_ref().map(Self::map_row).transpose()
    }
}

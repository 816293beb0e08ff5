#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum_test::TestServer;
use scanbridge_config::{Config, PublishConfig};
use scanbridge_core::{
    ScanBridge,
    scans::{BridgeScan, ScanRepository, ScanStoreError},
};
use scanbridge_server::{AppState, create_app};
use tempfile::TempDir;
use uuid::Uuid;

pub const TOKEN: &str = "pipeline-secret";

/// Scan repository that remembers every update and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingScanRepository {
    fail_with: Option<String>,
    updates: Mutex<Vec<(String, String)>>,
}

impl RecordingScanRepository {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().expect("updates lock").clone()
    }
}

#[async_trait]
impl ScanRepository for RecordingScanRepository {
    async fn mark_completed(
        &self,
        scan_id: &str,
        output_location: &str,
    ) -> Result<u64, ScanStoreError> {
        self.updates
            .lock()
            .expect("updates lock")
            .push((scan_id.to_string(), output_location.to_string()));
        match &self.fail_with {
            Some(message) => Err(ScanStoreError::Database(message.clone())),
            None => Ok(1),
        }
    }

    async fn find_bridge_scan(
        &self,
        _scan_id: Uuid,
    ) -> Result<Option<BridgeScan>, ScanStoreError> {
        Ok(None)
    }
}

#[derive(Default)]
pub struct TestAppOptions {
    pub token: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub scans: Option<Arc<dyn ScanRepository>>,
}

impl TestAppOptions {
    pub fn with_token() -> Self {
        Self {
            token: Some(TOKEN.to_string()),
            ..Self::default()
        }
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    tempdir: TempDir,
}

impl TestApp {
    pub fn state_file(&self) -> PathBuf {
        self.state.publish().state_file.clone()
    }

    pub fn scans_dir(&self) -> PathBuf {
        self.state.publish().pipeline_scans_dir()
    }

    pub fn root(&self) -> &std::path::Path {
        self.tempdir.path()
    }
}

pub fn build_test_app(options: TestAppOptions) -> TestApp {
    let tempdir =
        tempfile::tempdir().expect("failed to create temporary directory");

    let config = Config {
        publish: PublishConfig {
            state_file: tempdir.path().join("state/publish.json"),
            token: options.token,
            output_root: tempdir.path().join("output"),
            max_upload_bytes: options.max_upload_bytes,
        },
        ..Config::default()
    };

    let scans = options
        .scans
        .unwrap_or_else(|| Arc::new(RecordingScanRepository::default()));
    let bridge = ScanBridge::new(config.bridge.clone()).expect("bridge client");
    let state = AppState::new(Arc::new(config), scans, Arc::new(bridge));

    let server =
        TestServer::new(create_app(state.clone())).expect("test server");

    TestApp {
        server,
        state,
        tempdir,
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::entry::{PublishEntry, PublishState};

const LATEST_KEY: &str = "latest";
const EVENTS_KEY: &str = "events";

#[derive(Debug, Error)]
pub enum PublishStoreError {
    #[error("failed to write publish state {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode publish state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("publish state writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// File-backed [`PublishState`].
///
/// Every write rewrites the whole document through a sibling temporary file
/// that is renamed over the target, so readers never observe a half-written
/// file. Writers inside this process are serialized; separate processes
/// sharing the file still race and the last writer wins.
///
/// Writes merge into the document as stored. Keys and entries this store did
/// not write are carried over untouched.
#[derive(Debug)]
pub struct PublishStateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PublishStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Typed view of the current document. Entries that do not decode are
    /// left out.
    pub async fn load(&self) -> PublishState {
        PublishState::from_document(&self.load_document().await)
    }

    /// Current document as stored, with `latest` and `events` always
    /// present. A missing, unreadable or non-JSON file reads as the empty
    /// default rather than an error.
    pub async fn load_document(&self) -> Value {
        Value::Object(self.read_document().await)
    }

    /// Merge `entry` into the stored document and persist it.
    pub async fn record(
        &self,
        entry: PublishEntry,
    ) -> Result<PublishState, PublishStoreError> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await;
        let event = entry.event_key().to_string();
        let value = serde_json::to_value(&entry)?;

        let events = document
            .entry(EVENTS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(events) = events.as_object_mut() {
            events.insert(event.clone(), value.clone());
        }
        document.insert(LATEST_KEY.to_string(), value);

        let document = Value::Object(document);
        let bytes = serde_json::to_vec_pretty(&document)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await??;

        debug!(
            path = %self.path.display(),
            event = %event,
            "publish state written"
        );
        Ok(PublishState::from_document(&document))
    }

    async fn read_document(&self) -> Map<String, Value> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return empty_document();
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "publish state unreadable; using empty state"
                );
                return empty_document();
            }
        };

        let mut document = match serde_json::from_slice(&bytes) {
            Ok(Value::Object(document)) => document,
            Ok(_) => {
                warn!(
                    path = %self.path.display(),
                    "publish state is not a JSON object; using empty state"
                );
                return empty_document();
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "publish state is not valid JSON; using empty state"
                );
                return empty_document();
            }
        };

        document.entry(LATEST_KEY).or_insert(Value::Null);
        let events = document
            .entry(EVENTS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !events.is_object() {
            warn!(
                path = %self.path.display(),
                "publish state events is not an object; starting it over"
            );
            *events = Value::Object(Map::new());
        }
        document
    }
}

fn empty_document() -> Map<String, Value> {
    let mut document = Map::new();
    document.insert(LATEST_KEY.to_string(), Value::Null);
    document.insert(EVENTS_KEY.to_string(), Value::Object(Map::new()));
    document
}

fn write_atomically(
    path: &Path,
    bytes: &[u8],
) -> Result<(), PublishStoreError> {
    let io_err = |source: io::Error| PublishStoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn entry(event: &str, reduced: i64) -> PublishEntry {
        PublishEntry::from_event(
            &json!({"meta": {"event": event}, "payload": {"reduced": reduced}}),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn missing_file_reads_as_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PublishStateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().await, PublishState::default());
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_default_and_is_replaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").expect("seed corrupt file");
        let store = PublishStateStore::new(&path);

        assert_eq!(store.load().await, PublishState::default());

        store.record(entry("baseline_scan", 1)).await.expect("record");
        let reloaded = store.load().await;
        assert_eq!(reloaded.events.len(), 1);
    }

    #[tokio::test]
    async fn record_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/deeper/state.json");
        let store = PublishStateStore::new(&path);

        store.record(entry("baseline_scan", 5)).await.expect("record");

        assert!(path.exists());
        let on_disk: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).expect("read"))
                .expect("valid json");
        assert_eq!(on_disk["latest"]["summary"]["reduced"], json!(5));
    }

    #[tokio::test]
    async fn record_keeps_entries_it_cannot_decode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        let seeded = json!({
            "latest": null,
            "events": {
                "baseline_scan": {
                    "meta": {"event": "baseline_scan"},
                    "summary": {"reduced": 1}
                }
            },
            "dashboard": {"pinned": true}
        });
        std::fs::write(&path, seeded.to_string()).expect("seed state");
        let store = PublishStateStore::new(&path);

        store.record(entry("rescan", 2)).await.expect("record");

        let on_disk: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).expect("read"))
                .expect("valid json");
        assert_eq!(
            on_disk["events"]["baseline_scan"],
            seeded["events"]["baseline_scan"]
        );
        assert_eq!(on_disk["events"]["rescan"]["summary"]["reduced"], json!(2));
        assert_eq!(on_disk["latest"]["meta"]["event"], json!("rescan"));
        assert_eq!(on_disk["dashboard"], json!({"pinned": true}));

        let document = store.load_document().await;
        assert_eq!(document["events"].as_object().expect("events").len(), 2);
        assert_eq!(store.load().await.events.len(), 1);
    }

    #[tokio::test]
    async fn fractional_offset_timestamps_decode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        let seeded = json!({
            "latest": null,
            "events": {
                "baseline_scan": {
                    "received_at": "2025-01-01T00:00:00.123456+00:00",
                    "meta": {"event": "baseline_scan"},
                    "summary": {"reduced": 1}
                }
            }
        });
        std::fs::write(&path, seeded.to_string()).expect("seed state");
        let store = PublishStateStore::new(&path);

        let state = store.load().await;

        assert_eq!(state.events.len(), 1);
        assert_eq!(state.latest, None);
    }

    #[tokio::test]
    async fn non_object_document_reads_as_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"[1, 2, 3]").expect("seed state");
        let store = PublishStateStore::new(&path);

        assert_eq!(
            store.load_document().await,
            json!({"latest": null, "events": {}})
        );
        assert_eq!(store.load().await, PublishState::default());
    }

    #[tokio::test]
    async fn concurrent_records_in_one_process_are_not_lost() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = std::sync::Arc::new(PublishStateStore::new(
            dir.path().join("state.json"),
        ));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.record(entry(&format!("event_{i}"), i)).await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("record");
        }

        assert_eq!(store.load().await.events.len(), 8);
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::summary::extract_summary;

/// Key used for events published without a name.
pub const UNKNOWN_EVENT: &str = "unknown";

/// Provenance of a published event, as reported by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishMeta {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub framework: String,
    #[serde(default)]
    pub source_file: String,
    /// Passed through untouched; the pipeline sends a number or `null`.
    #[serde(default)]
    pub published_at_epoch: Value,
}

impl PublishMeta {
    /// Read the fixed meta fields out of an arbitrary JSON value. Missing
    /// fields become empty strings and a non-object value yields defaults.
    pub fn from_value(meta: &Value) -> Self {
        let field =
            |name: &str| meta.get(name).map(meta_text).unwrap_or_default();

        Self {
            event: field("event"),
            repo: field("repo"),
            run_id: field("run_id"),
            account_id: field("account_id"),
            region: field("region"),
            framework: field("framework"),
            source_file: field("source_file"),
            published_at_epoch: meta
                .get("published_at_epoch")
                .cloned()
                .unwrap_or(Value::Null),
        }
    }
}

/// Render a meta value as text. Run ids and account ids frequently arrive as
/// JSON numbers.
fn meta_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishEntry {
    pub received_at: DateTime<Utc>,
    pub meta: PublishMeta,
    #[serde(default)]
    pub summary: Map<String, Value>,
}

impl PublishEntry {
    /// Build an entry from a request body of shape
    /// `{meta: {...}, payload: {...}}`.
    pub fn from_event(body: &Value, received_at: DateTime<Utc>) -> Self {
        let meta = body
            .get("meta")
            .filter(|meta| meta.is_object())
            .map(PublishMeta::from_value)
            .unwrap_or_default();
        let summary = body
            .get("payload")
            .map(extract_summary)
            .unwrap_or_default();

        Self {
            received_at,
            meta,
            summary,
        }
    }

    /// Name the entry is stored under.
    pub fn event_key(&self) -> &str {
        if self.meta.event.is_empty() {
            UNKNOWN_EVENT
        } else {
            &self.meta.event
        }
    }
}

/// The persisted document: the most recent entry overall plus the most
/// recent entry per event name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishState {
    #[serde(default)]
    pub latest: Option<PublishEntry>,
    #[serde(default)]
    pub events: BTreeMap<String, PublishEntry>,
}

impl PublishState {
    /// Store `entry` under its event key, replacing any previous value, and
    /// make it the latest entry.
    pub fn merge(&mut self, entry: PublishEntry) {
        self.events
            .insert(entry.event_key().to_string(), entry.clone());
        self.latest = Some(entry);
    }

    /// Typed view of a stored document. Entries that do not decode are left
    /// out of the view; the document itself keeps them.
    pub fn from_document(document: &Value) -> Self {
        let latest = document
            .get("latest")
            .filter(|latest| !latest.is_null())
            .and_then(|latest| decode_entry("latest", latest));
        let events = document
            .get("events")
            .and_then(Value::as_object)
            .map(|events| {
                events
                    .iter()
                    .filter_map(|(key, value)| {
                        let entry = decode_entry(key, value)?;
                        Some((key.clone(), entry))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { latest, events }
    }
}

fn decode_entry(key: &str, value: &Value) -> Option<PublishEntry> {
    match PublishEntry::deserialize(value) {
        Ok(entry) => Some(entry),
        Err(err) => {
            debug!(key, error = %err, "publish entry does not decode; skipped");
            None
        }
    }
}

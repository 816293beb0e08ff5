use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{
    constants::CONFIG_PATH_VAR,
    util::{non_empty, parse_flag},
};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub bridge: FileBridgeConfig,
    #[serde(default)]
    pub publish: FilePublishConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileBridgeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_workflow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_sec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FilePublishConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
}

/// Environment-derived configuration values.
///
/// Values that need interpretation (mode, account-id source, timeout) are kept
/// raw so the loader can fall back to defaults and report a warning instead of
/// failing.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub bridge_enabled: Option<bool>,
    pub bridge_mode: Option<String>,
    pub bridge_url: Option<String>,
    pub bridge_github_repo: Option<String>,
    pub bridge_github_workflow: Option<String>,
    pub bridge_token: Option<String>,
    pub bridge_timeout_sec: Option<String>,
    pub bridge_region: Option<String>,
    pub bridge_ref: Option<String>,
    pub bridge_compliance_mode: Option<String>,
    pub bridge_account_id_source: Option<String>,
    pub bridge_account_id: Option<String>,
    pub publish_state_file: Option<PathBuf>,
    pub publish_token: Option<String>,
    pub publish_max_upload_bytes: Option<String>,
    pub output_root: Option<PathBuf>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::gather_from(|name| std::env::var(name).ok())
    }

    /// Collect values through an arbitrary lookup so callers (and tests) do
    /// not have to mutate the process environment.
    pub fn gather_from<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).and_then(non_empty);

        Self {
            config_path: var(CONFIG_PATH_VAR).map(PathBuf::from),
            server_host: var("SERVER_HOST"),
            server_port: var("SERVER_PORT").and_then(|s| s.parse().ok()),
            database_url: var("DATABASE_URL"),
            bridge_enabled: lookup("DJANGO_SCAN_BRIDGE_ENABLED")
                .and_then(|raw| parse_flag(&raw)),
            bridge_mode: var("DJANGO_SCAN_BRIDGE_MODE"),
            bridge_url: var("DJANGO_SCAN_BRIDGE_URL"),
            bridge_github_repo: var("DJANGO_SCAN_BRIDGE_GH_REPO"),
            bridge_github_workflow: var("DJANGO_SCAN_BRIDGE_GH_WORKFLOW"),
            bridge_token: var("DJANGO_SCAN_BRIDGE_TOKEN"),
            bridge_timeout_sec: var("DJANGO_SCAN_BRIDGE_TIMEOUT_SEC"),
            bridge_region: var("DJANGO_SCAN_BRIDGE_REGION"),
            bridge_ref: var("DJANGO_SCAN_BRIDGE_REF"),
            bridge_compliance_mode: var("DJANGO_SCAN_BRIDGE_COMPLIANCE_MODE"),
            bridge_account_id_source: var(
                "DJANGO_SCAN_BRIDGE_ACCOUNT_ID_SOURCE",
            ),
            bridge_account_id: var("DJANGO_SCAN_BRIDGE_ACCOUNT_ID"),
            publish_state_file: var("DJANGO_PIPELINE_PUBLISH_STATE_FILE")
                .map(PathBuf::from),
            publish_token: var("DJANGO_PIPELINE_PUBLISH_TOKEN"),
            publish_max_upload_bytes: var(
                "DJANGO_PIPELINE_PUBLISH_MAX_UPLOAD_BYTES",
            ),
            output_root: var("DJANGO_TMP_OUTPUT_DIRECTORY").map(PathBuf::from),
        }
    }
}

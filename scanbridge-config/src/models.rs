use std::{fmt, path::PathBuf, time::Duration};

use crate::constants::{
    DEFAULT_COMPLIANCE_MODE, DEFAULT_GIT_REF, DEFAULT_GITHUB_WORKFLOW,
    DEFAULT_OUTPUT_ROOT, DEFAULT_PUBLISH_STATE_FILE, DEFAULT_REGION,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_TIMEOUT_SECS,
};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub bridge: BridgeConfig,
    pub publish: PublishConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

/// How the notifier delivers a scan-created notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeMode {
    /// POST the generic payload to a configured URL.
    #[default]
    Bridge,
    /// POST a `workflow_dispatch` body to the GitHub REST API.
    GithubDispatch,
}

impl BridgeMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bridge" => Some(Self::Bridge),
            "github_dispatch" => Some(Self::GithubDispatch),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bridge => "bridge",
            Self::GithubDispatch => "github_dispatch",
        }
    }
}

impl fmt::Display for BridgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the target cloud account id comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountIdSource {
    /// The scan's provider external identifier.
    #[default]
    ProviderUid,
    /// A fixed override from configuration.
    Env,
}

impl AccountIdSource {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "provider_uid" => Some(Self::ProviderUid),
            "env" => Some(Self::Env),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProviderUid => "provider_uid",
            Self::Env => "env",
        }
    }
}

impl fmt::Display for AccountIdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for the outbound scan-created notifier.
#[derive(Clone)]
pub struct BridgeConfig {
    pub enabled: bool,
    pub mode: BridgeMode,
    pub url: Option<String>,
    pub github_repo: Option<String>,
    pub github_workflow: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub region: String,
    pub git_ref: String,
    pub compliance_mode: String,
    pub account_id_source: AccountIdSource,
    pub account_id: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: BridgeMode::Bridge,
            url: None,
            github_repo: None,
            github_workflow: DEFAULT_GITHUB_WORKFLOW.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            region: DEFAULT_REGION.to_string(),
            git_ref: DEFAULT_GIT_REF.to_string(),
            compliance_mode: DEFAULT_COMPLIANCE_MODE.to_string(),
            account_id_source: AccountIdSource::ProviderUid,
            account_id: None,
        }
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("enabled", &self.enabled)
            .field("mode", &self.mode)
            .field("url", &self.url)
            .field("github_repo", &self.github_repo)
            .field("github_workflow", &self.github_workflow)
            .field("has_token", &self.token.is_some())
            .field("timeout", &self.timeout)
            .field("region", &self.region)
            .field("git_ref", &self.git_ref)
            .field("compliance_mode", &self.compliance_mode)
            .field("account_id_source", &self.account_id_source)
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Settings for the inbound publish endpoints.
#[derive(Clone)]
pub struct PublishConfig {
    pub state_file: PathBuf,
    /// Shared secret expected as a bearer token. `None` leaves the endpoints
    /// open.
    pub token: Option<String>,
    pub output_root: PathBuf,
    /// Upper bound for uploaded report archives. `None` disables the limit.
    pub max_upload_bytes: Option<usize>,
}

impl PublishConfig {
    /// Directory that receives uploaded report archives.
    pub fn pipeline_scans_dir(&self) -> PathBuf {
        self.output_root.join("pipeline_scans")
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(DEFAULT_PUBLISH_STATE_FILE),
            token: None,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            max_upload_bytes: None,
        }
    }
}

impl fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("state_file", &self.state_file)
            .field("has_token", &self.token.is_some())
            .field("output_root", &self.output_root)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

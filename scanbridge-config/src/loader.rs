use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

use crate::{
    constants::{
        DEFAULT_COMPLIANCE_MODE, DEFAULT_GIT_REF, DEFAULT_GITHUB_WORKFLOW,
        DEFAULT_OUTPUT_ROOT, DEFAULT_PUBLISH_STATE_FILE, DEFAULT_REGION,
        DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_TIMEOUT_SECS,
    },
    models::{
        AccountIdSource, BridgeConfig, BridgeMode, Config, ConfigMetadata,
        DatabaseConfig, PublishConfig, ServerConfig,
    },
    sources::{EnvConfig, FileConfig},
    util::non_empty,
    validation::{self, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: &[&str] =
    &["scanbridge.toml", "config/scanbridge.toml"];

#[derive(Debug, Default, Clone)]
struct ConfigLoaderOptions {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let env_config = EnvConfig::gather();
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let mut load = self.compose(file_config, env_config);
        load.config.metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
        };
        Ok(load)
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env_config.config_path.clone());

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                path
            }
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(Path::new)
                .find(|candidate| candidate.exists())
            {
                Some(found) => found.to_path_buf(),
                None => return Ok((None, None)),
            },
        };

        let contents =
            fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
                path: path.clone(),
                source,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| {
                ConfigLoadError::Parse {
                    path: path.clone(),
                    source,
                }
            })?;

        Ok((Some(file_config), Some(path)))
    }

    /// Merge file values and environment values over the built-in defaults.
    /// Environment wins over the file, the file wins over defaults.
    pub fn compose(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
    ) -> ConfigLoad {
        let mut warnings = ConfigWarnings::default();
        let FileConfig {
            server: file_server,
            database: file_database,
            bridge: file_bridge,
            publish: file_publish,
        } = file_config.unwrap_or_default();

        let server = ServerConfig {
            host: env
                .server_host
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            port: env
                .server_port
                .or(file_server.port)
                .unwrap_or(DEFAULT_SERVER_PORT),
        };

        let database = DatabaseConfig {
            url: env.database_url.or(file_database.url.and_then(non_empty)),
        };

        let mode = match env.bridge_mode.or(file_bridge.mode) {
            None => BridgeMode::default(),
            Some(raw) => BridgeMode::parse(&raw).unwrap_or_else(|| {
                warnings.push(format!(
                    "unknown scan bridge mode `{raw}`; using `bridge`"
                ));
                BridgeMode::Bridge
            }),
        };

        let account_id_source = match env
            .bridge_account_id_source
            .or(file_bridge.account_id_source)
        {
            None => AccountIdSource::default(),
            Some(raw) => AccountIdSource::parse(&raw).unwrap_or_else(|| {
                warnings.push(format!(
                    "unknown account id source `{raw}`; using `provider_uid`"
                ));
                AccountIdSource::ProviderUid
            }),
        };

        let timeout_secs = match env.bridge_timeout_sec {
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                warnings.push(format!(
                    "invalid scan bridge timeout `{raw}`; \
                     using {DEFAULT_TIMEOUT_SECS}s"
                ));
                DEFAULT_TIMEOUT_SECS
            }),
            None => file_bridge.timeout_sec.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let bridge = BridgeConfig {
            enabled: env
                .bridge_enabled
                .or(file_bridge.enabled)
                .unwrap_or(false),
            mode,
            url: env.bridge_url.or(file_bridge.url.and_then(non_empty)),
            github_repo: env
                .bridge_github_repo
                .or(file_bridge.github_repo.and_then(non_empty)),
            github_workflow: env
                .bridge_github_workflow
                .or(file_bridge.github_workflow.and_then(non_empty))
                .unwrap_or_else(|| DEFAULT_GITHUB_WORKFLOW.to_string()),
            token: env.bridge_token.or(file_bridge.token.and_then(non_empty)),
            timeout: Duration::from_secs(timeout_secs),
            region: env
                .bridge_region
                .or(file_bridge.region.and_then(non_empty))
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            git_ref: env
                .bridge_ref
                .or(file_bridge.git_ref.and_then(non_empty))
                .unwrap_or_else(|| DEFAULT_GIT_REF.to_string()),
            compliance_mode: env
                .bridge_compliance_mode
                .or(file_bridge.compliance_mode.and_then(non_empty))
                .unwrap_or_else(|| DEFAULT_COMPLIANCE_MODE.to_string()),
            account_id_source,
            account_id: env
                .bridge_account_id
                .or(file_bridge.account_id.and_then(non_empty)),
        };

        let max_upload_bytes = match env.publish_max_upload_bytes {
            Some(raw) => match raw.parse::<usize>() {
                Ok(limit) => Some(limit),
                Err(_) => {
                    warnings.push(format!(
                        "invalid upload size limit `{raw}`; \
                         uploads are unbounded"
                    ));
                    None
                }
            },
            None => file_publish.max_upload_bytes,
        };

        let publish = PublishConfig {
            state_file: env
                .publish_state_file
                .or(file_publish.state_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLISH_STATE_FILE)),
            token: env
                .publish_token
                .or(file_publish.token.and_then(non_empty)),
            output_root: env
                .output_root
                .or(file_publish.output_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT)),
            max_upload_bytes,
        };

        let config = Config {
            server,
            database,
            bridge,
            publish,
            metadata: ConfigMetadata::default(),
        };

        warnings.extend(validation::apply_guard_rails(&config));

        ConfigLoad { config, warnings }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(raw: &str) -> FileConfig {
        toml::from_str(raw).expect("valid toml")
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let ConfigLoad { config, .. } =
            ConfigLoader::new().compose(None, EnvConfig::default());

        assert!(!config.bridge.enabled);
        assert_eq!(config.bridge.mode, BridgeMode::Bridge);
        assert_eq!(config.bridge.github_workflow, "scan-cis.yml");
        assert_eq!(config.bridge.timeout, Duration::from_secs(20));
        assert_eq!(config.bridge.region, "ap-northeast-2");
        assert_eq!(config.bridge.git_ref, "main");
        assert_eq!(config.bridge.compliance_mode, "cis_1.4_plus_isms_p");
        assert_eq!(
            config.bridge.account_id_source,
            AccountIdSource::ProviderUid
        );
        assert_eq!(
            config.publish.state_file,
            PathBuf::from("/tmp/prowler_pipeline_publish_state.json")
        );
        assert_eq!(
            config.publish.pipeline_scans_dir(),
            PathBuf::from("/tmp/prowler_api_output/pipeline_scans")
        );
        assert!(config.publish.token.is_none());
    }

    #[test]
    fn environment_overrides_file() {
        let file = file(
            r#"
            [bridge]
            enabled = false
            url = "https://file.example.test/hook"
            region = "eu-west-1"
            "#,
        );
        let env = EnvConfig {
            bridge_enabled: Some(true),
            bridge_url: Some("https://env.example.test/hook".into()),
            ..EnvConfig::default()
        };

        let ConfigLoad { config, .. } =
            ConfigLoader::new().compose(Some(file), env);

        assert!(config.bridge.enabled);
        assert_eq!(
            config.bridge.url.as_deref(),
            Some("https://env.example.test/hook")
        );
        assert_eq!(config.bridge.region, "eu-west-1");
    }

    #[test]
    fn bad_values_fall_back_with_warnings() {
        let env = EnvConfig {
            bridge_mode: Some("carrier-pigeon".into()),
            bridge_account_id_source: Some("tenant".into()),
            bridge_timeout_sec: Some("soon".into()),
            publish_token: Some("secret".into()),
            ..EnvConfig::default()
        };

        let ConfigLoad { config, warnings } =
            ConfigLoader::new().compose(None, env);

        assert_eq!(config.bridge.mode, BridgeMode::Bridge);
        assert_eq!(
            config.bridge.account_id_source,
            AccountIdSource::ProviderUid
        );
        assert_eq!(config.bridge.timeout, Duration::from_secs(20));
        assert!(warnings.contains("carrier-pigeon"));
        assert!(warnings.contains("tenant"));
        assert!(warnings.contains("soon"));
    }

    #[test]
    fn blank_file_values_count_as_unset() {
        let file = file(
            r#"
            [publish]
            token = "  "

            [bridge]
            github_workflow = ""
            "#,
        );

        let ConfigLoad { config, .. } =
            ConfigLoader::new().compose(Some(file), EnvConfig::default());

        assert!(config.publish.token.is_none());
        assert_eq!(config.bridge.github_workflow, "scan-cis.yml");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loader = ConfigLoader::new()
            .with_config_path(dir.path().join("absent.toml"))
            .with_env_file(dir.path().join(".env"));

        assert!(matches!(
            loader.load(),
            Err(ConfigLoadError::MissingConfig { .. })
        ));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scanbridge.toml");
        fs::write(
            &path,
            r#"
            [server]
            port = 9911
            "#,
        )
        .expect("write config");

        let load = ConfigLoader::new()
            .with_config_path(&path)
            .with_env_file(dir.path().join(".env"))
            .load()
            .expect("config loads");

        assert_eq!(
            load.config.metadata.config_path.as_deref(),
            Some(path.as_path())
        );
        assert!(!load.config.metadata.env_file_loaded);
    }
}

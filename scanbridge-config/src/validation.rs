use crate::models::{AccountIdSource, BridgeMode, Config};

/// A non-fatal configuration issue surfaced at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint(
        &mut self,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.items.iter().any(|w| w.message.contains(needle))
    }
}

/// Flag combinations that load fine but leave a feature silently inert.
pub fn apply_guard_rails(config: &Config) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();
    let bridge = &config.bridge;

    if bridge.enabled {
        match bridge.mode {
            BridgeMode::Bridge if bridge.url.is_none() => {
                warnings.push_with_hint(
                    "scan bridge is enabled but no bridge URL is configured; \
                     notifications will be skipped",
                    "Set DJANGO_SCAN_BRIDGE_URL or [bridge].url",
                );
            }
            BridgeMode::GithubDispatch if bridge.github_repo.is_none() => {
                warnings.push_with_hint(
                    "scan bridge is in github_dispatch mode but no repository \
                     is configured; notifications will be skipped",
                    "Set DJANGO_SCAN_BRIDGE_GH_REPO or [bridge].github_repo",
                );
            }
            _ => {}
        }

        if bridge.account_id_source == AccountIdSource::Env
            && bridge.account_id.is_none()
        {
            warnings.push_with_hint(
                "account id source is `env` but no account id is \
                 configured; notifications will be skipped",
                "Set DJANGO_SCAN_BRIDGE_ACCOUNT_ID or [bridge].account_id",
            );
        }
    }

    if config.publish.token.is_none() {
        warnings.push_with_hint(
            "no pipeline publish token configured; publish endpoints \
             accept unauthenticated requests",
            "Set DJANGO_PIPELINE_PUBLISH_TOKEN to require a bearer token",
        );
    }

    warnings
}

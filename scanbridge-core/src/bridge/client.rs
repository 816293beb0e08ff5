use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use reqwest::{
    Client, Response, StatusCode,
    header::{
        ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION,
        USER_AGENT,
    },
    redirect::Policy,
};
use scanbridge_config::{AccountIdSource, BridgeConfig, BridgeMode};
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;
use url::Url;

use super::{
    GITHUB_API_BASE, GITHUB_API_VERSION, GITHUB_MEDIA_TYPE,
    outcome::{BridgeOutcome, SkipReason},
    payload::{NotificationPayload, ScanContext},
};
use crate::scans::BridgeScan;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to build scan bridge HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Notifier holding its configuration and one reusable HTTP client.
///
/// The client never follows redirects on its own; [`ScanBridge::deliver`]
/// re-posts to a redirect target exactly once.
#[derive(Debug, Clone)]
pub struct ScanBridge {
    config: BridgeConfig,
    client: Client,
    github_api_base: String,
}

impl ScanBridge {
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            config,
            client,
            github_api_base: GITHUB_API_BASE.to_string(),
        })
    }

    /// Point dispatch mode at a different GitHub API root, e.g. a GitHub
    /// Enterprise Server instance.
    pub fn with_github_api_base(mut self, base: impl Into<String>) -> Self {
        self.github_api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Account the pipeline should scan. Empty when nothing is known.
    pub fn resolve_account_id(&self, scan: &BridgeScan) -> String {
        match self.config.account_id_source {
            AccountIdSource::Env => {
                self.config.account_id.clone().unwrap_or_default()
            }
            AccountIdSource::ProviderUid => {
                scan.provider_uid().trim().to_string()
            }
        }
    }

    pub fn build_payload(
        &self,
        scan: &BridgeScan,
        tenant_id: &str,
    ) -> NotificationPayload {
        NotificationPayload {
            account_id: self.resolve_account_id(scan),
            region: self.config.region.clone(),
            deploy_vulnerable: true,
            git_ref: self.config.git_ref.clone(),
            scan_context: ScanContext {
                scan_id: scan.id.to_string(),
                tenant_id: tenant_id.to_string(),
                provider_id: scan.provider_id.to_string(),
                provider_uid: scan.provider_uid().to_string(),
                provider_alias: scan.provider_alias().to_string(),
                scan_name: scan.name.clone().unwrap_or_default(),
            },
        }
    }

    /// URL the notification goes to, or why there is none.
    pub fn endpoint(&self) -> Result<String, SkipReason> {
        match self.config.mode {
            BridgeMode::GithubDispatch => {
                let repo = self
                    .config
                    .github_repo
                    .as_deref()
                    .ok_or(SkipReason::MissingRepository)?;
                Ok(format!(
                    "{}/repos/{}/actions/workflows/{}/dispatches",
                    self.github_api_base, repo, self.config.github_workflow
                ))
            }
            BridgeMode::Bridge => {
                self.config.url.clone().ok_or(SkipReason::MissingUrl)
            }
        }
    }

    /// Attempt one notification and report what happened.
    pub async fn deliver(
        &self,
        scan: &BridgeScan,
        tenant_id: &str,
    ) -> BridgeOutcome {
        if !self.config.enabled {
            return BridgeOutcome::Disabled;
        }

        let endpoint = match self.endpoint() {
            Ok(endpoint) => endpoint,
            Err(reason) => return BridgeOutcome::Skipped(reason),
        };

        let payload = self.build_payload(scan, tenant_id);
        if payload.account_id.is_empty() {
            return BridgeOutcome::Skipped(SkipReason::MissingAccountId {
                provider_uid: payload.scan_context.provider_uid,
            });
        }

        let body = match self.encode_body(&payload) {
            Ok(body) => body,
            Err(err) => {
                return BridgeOutcome::Failed {
                    error: format!("failed to encode payload: {err}"),
                };
            }
        };

        let headers = match self.headers() {
            Ok(headers) => headers,
            Err(err) => return BridgeOutcome::Failed { error: err },
        };

        self.post_with_redirect(scan, &endpoint, headers, body).await
    }

    /// Fire the notifier. Every outcome, including a panic inside delivery,
    /// ends up in the log and nowhere else.
    pub async fn trigger(&self, scan: &BridgeScan, tenant_id: &str) {
        let outcome = AssertUnwindSafe(self.deliver(scan, tenant_id))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| BridgeOutcome::Failed {
                error: panic_message(panic.as_ref()),
            });
        outcome.log(scan.id);
    }

    /// Run [`ScanBridge::trigger`] on a background task so the caller does
    /// not wait for the network.
    pub fn spawn_trigger(
        self: &Arc<Self>,
        scan: BridgeScan,
        tenant_id: String,
    ) -> JoinHandle<()> {
        let bridge = Arc::clone(self);
        tokio::spawn(async move { bridge.trigger(&scan, &tenant_id).await })
    }

    fn encode_body(
        &self,
        payload: &NotificationPayload,
    ) -> Result<Vec<u8>, serde_json::Error> {
        match self.config.mode {
            BridgeMode::GithubDispatch => serde_json::to_vec(
                &payload.to_dispatch(&self.config.compliance_mode),
            ),
            BridgeMode::Bridge => serde_json::to_vec(payload),
        }
    }

    fn headers(&self) -> Result<HeaderMap, String> {
        let mut headers = HeaderMap::new();
        headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(super::USER_AGENT));

        if let Some(token) = self.config.token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| {
                    "bridge token is not a valid header value".to_string()
                })?;
            headers.insert(AUTHORIZATION, value);
        }

        if self.config.mode == BridgeMode::GithubDispatch {
            headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
            headers.insert(
                "x-github-api-version",
                HeaderValue::from_static(GITHUB_API_VERSION),
            );
        }

        Ok(headers)
    }

    async fn post(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Response, reqwest::Error> {
        self.client
            .post(url)
            .headers(headers.clone())
            .body(body.to_vec())
            .send()
            .await
    }

    async fn post_with_redirect(
        &self,
        scan: &BridgeScan,
        url: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> BridgeOutcome {
        let response = match self.post(url, &headers, &body).await {
            Ok(response) => response,
            Err(err) => {
                return BridgeOutcome::Transport {
                    error: err.to_string(),
                };
            }
        };

        let status = response.status();
        if status.is_success() {
            return BridgeOutcome::Delivered {
                status: status.as_u16(),
                url: url.to_string(),
                redirected_from: None,
            };
        }

        if !is_post_redirect(status) {
            let detail = response.text().await.unwrap_or_default();
            return BridgeOutcome::Rejected {
                status: status.as_u16(),
                detail,
            };
        }

        let Some(target) = redirect_target(url, response).await else {
            return BridgeOutcome::Rejected {
                status: status.as_u16(),
                detail: String::new(),
            };
        };

        info!(
            scan_id = %scan.id,
            status = status.as_u16(),
            from = %url,
            to = %target,
            "scan bridge following redirect"
        );

        match self.post(&target, &headers, &body).await {
            Ok(second) if second.status().is_success() => {
                BridgeOutcome::Delivered {
                    status: second.status().as_u16(),
                    url: target,
                    redirected_from: Some(url.to_string()),
                }
            }
            Ok(second) => {
                let code = second.status();
                let detail = second.text().await.unwrap_or_default();
                BridgeOutcome::RedirectFailed {
                    status: status.as_u16(),
                    target,
                    error: format!("HTTP {}: {}", code.as_u16(), detail),
                }
            }
            Err(err) => BridgeOutcome::RedirectFailed {
                status: status.as_u16(),
                target,
                error: err.to_string(),
            },
        }
    }
}

fn is_post_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Redirect target from `Location`, falling back to a `url` field in a JSON
/// body. Relative targets resolve against the request URL.
async fn redirect_target(
    request_url: &str,
    response: Response,
) -> Option<String> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let raw = match location {
        Some(location) => location,
        None => {
            let body = response.text().await.unwrap_or_default();
            serde_json::from_str::<Value>(&body)
                .ok()?
                .get("url")?
                .as_str()
                .map(str::trim)
                .filter(|value| !value.is_empty())?
                .to_string()
        }
    };

    Some(resolve_target(request_url, &raw))
}

fn resolve_target(request_url: &str, raw: &str) -> String {
    Url::parse(request_url)
        .and_then(|base| base.join(raw))
        .map(String::from)
        .unwrap_or_else(|_| raw.to_string())
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic during delivery".to_string()
    }
}

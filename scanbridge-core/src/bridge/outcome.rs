use std::fmt;

use tracing::{error, info, warn};
use uuid::Uuid;

/// Why a notification was not attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `bridge` mode without a target URL.
    MissingUrl,
    /// `github_dispatch` mode without a repository.
    MissingRepository,
    /// Neither the provider nor the environment supplied an account id.
    MissingAccountId { provider_uid: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUrl => f.write_str("bridge URL is empty"),
            Self::MissingRepository => {
                f.write_str("github_dispatch mode but repository is empty")
            }
            Self::MissingAccountId { .. } => f.write_str("account_id empty"),
        }
    }
}

/// Result of one delivery attempt. Only ever consumed for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    Disabled,
    Skipped(SkipReason),
    Delivered {
        status: u16,
        url: String,
        /// Original target when the request was accepted after one redirect.
        redirected_from: Option<String>,
    },
    /// Non-success status from the first hop.
    Rejected { status: u16, detail: String },
    /// The single redirect hop failed.
    RedirectFailed {
        status: u16,
        target: String,
        error: String,
    },
    /// DNS, connect, TLS or timeout failure before any status arrived.
    Transport { error: String },
    Failed { error: String },
}

impl BridgeOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub(crate) fn log(&self, scan_id: Uuid) {
        match self {
            Self::Disabled => {}
            Self::Skipped(SkipReason::MissingAccountId { provider_uid }) => {
                warn!(
                    %scan_id,
                    provider_uid = %provider_uid,
                    "scan bridge skipped: account_id empty"
                );
            }
            Self::Skipped(reason) => {
                warn!(%scan_id, "scan bridge enabled but {reason}");
            }
            Self::Delivered {
                status,
                url,
                redirected_from: None,
            } => {
                info!(%scan_id, status, url = %url, "scan bridge triggered");
            }
            Self::Delivered {
                status,
                url,
                redirected_from: Some(from),
            } => {
                info!(
                    %scan_id,
                    status,
                    url = %url,
                    from = %from,
                    "scan bridge triggered after redirect"
                );
            }
            Self::Rejected { status, detail } => {
                warn!(
                    %scan_id,
                    status,
                    detail = %detail,
                    "scan bridge http error"
                );
            }
            Self::RedirectFailed {
                status,
                target,
                error,
            } => {
                warn!(
                    %scan_id,
                    status,
                    target = %target,
                    error = %error,
                    "scan bridge redirect follow error"
                );
            }
            Self::Transport { error } => {
                warn!(%scan_id, error = %error, "scan bridge transport error");
            }
            Self::Failed { error } => {
                error!(
                    %scan_id,
                    error = %error,
                    "scan bridge unexpected error"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_delivered_counts_as_delivered() {
        assert!(
            BridgeOutcome::Delivered {
                status: 204,
                url: "http://hook".into(),
                redirected_from: None,
            }
            .is_delivered()
        );
        assert!(!BridgeOutcome::Disabled.is_delivered());
        assert!(
            !BridgeOutcome::Rejected {
                status: 500,
                detail: String::new(),
            }
            .is_delivered()
        );
    }

    #[test]
    fn skip_reasons_read_as_log_text() {
        assert_eq!(SkipReason::MissingUrl.to_string(), "bridge URL is empty");
        assert_eq!(
            SkipReason::MissingRepository.to_string(),
            "github_dispatch mode but repository is empty"
        );
    }
}

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, header::AUTHORIZATION, request::Parts},
};
use constant_time_eq::constant_time_eq;
use tracing::warn;

use crate::infra::{app_state::AppState, errors::AppError};

pub const UNAUTHORIZED_DETAIL: &str = "Unauthorized pipeline publish token.";

/// Proof that a request passed the publish token check.
///
/// With no token configured every request passes. Otherwise the request must
/// carry `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct PublishAuth;

impl FromRequestParts<AppState> for PublishAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.publish().token.as_deref();
        if is_authorized(parts.headers.get(AUTHORIZATION), expected) {
            Ok(PublishAuth)
        } else {
            warn!(
                path = %parts.uri.path(),
                "rejected pipeline publish request"
            );
            Err(AppError::unauthorized(UNAUTHORIZED_DETAIL))
        }
    }
}

pub fn is_authorized(
    header: Option<&HeaderValue>,
    expected: Option<&str>,
) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    header
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| {
            constant_time_eq(token.trim().as_bytes(), expected.as_bytes())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(raw: &str) -> HeaderValue {
        HeaderValue::from_str(raw).expect("header value")
    }

    #[test]
    fn open_when_no_token_configured() {
        assert!(is_authorized(None, None));
        assert!(is_authorized(Some(&header("Bearer anything")), None));
    }

    #[test]
    fn requires_matching_bearer_token() {
        let expected = Some("s3cret");
        assert!(is_authorized(Some(&header("Bearer s3cret")), expected));
        assert!(is_authorized(Some(&header("Bearer  s3cret ")), expected));
        assert!(!is_authorized(Some(&header("Bearer wrong")), expected));
        assert!(!is_authorized(Some(&header("bearer s3cret")), expected));
        assert!(!is_authorized(Some(&header("s3cret")), expected));
        assert!(!is_authorized(None, expected));
    }
}

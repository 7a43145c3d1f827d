//! Bearer token authentication for the reload endpoint
//!
//! The `Authorization` header must contain the literal `Bearer`; the
//! credential is what remains after removing the first `"Bearer "` from the
//! header value. It is compared against the shared secret in constant time.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::debug;

use crate::secrets::Secret;

const BEARER: &str = "Bearer";
const BEARER_PREFIX: &str = "Bearer ";

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No usable `Authorization` header
    MissingHeader,
    /// Header present but not a bearer credential
    NotBearer,
    /// Bearer credential does not match the shared secret
    InvalidToken,
}

impl AuthRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthRejection::MissingHeader => "missing authorization header",
            AuthRejection::NotBearer => "authorization is not a bearer token",
            AuthRejection::InvalidToken => "invalid bearer token",
        }
    }
}

impl std::fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates bearer credentials against the shared secret
#[derive(Debug, Clone)]
pub struct BearerAuth {
    secret: Secret,
}

impl BearerAuth {
    pub fn new(secret: Secret) -> Self {
        Self { secret }
    }

    /// Check the request headers
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AuthRejection> {
        let value = extract_authorization_header(headers).ok_or(AuthRejection::MissingHeader)?;
        let token = extract_bearer_token(value).ok_or(AuthRejection::NotBearer)?;

        if self.secret.matches(&token) {
            debug!("Bearer token accepted");
            Ok(())
        } else {
            Err(AuthRejection::InvalidToken)
        }
    }
}

/// Non-empty, UTF-8 `Authorization` header value
fn extract_authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Credential carried by a bearer header value
fn extract_bearer_token(value: &str) -> Option<String> {
    if !value.contains(BEARER) {
        return None;
    }
    Some(value.replacen(BEARER_PREFIX, "", 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    fn auth() -> BearerAuth {
        BearerAuth::new(Secret::new("s3cr3t"))
    }

    #[test]
    fn test_valid_bearer_token() {
        assert_eq!(auth().authorize(&headers_with("Bearer s3cr3t")), Ok(()));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            auth().authorize(&HeaderMap::new()),
            Err(AuthRejection::MissingHeader)
        );
        assert_eq!(
            auth().authorize(&headers_with("")),
            Err(AuthRejection::MissingHeader)
        );
    }

    #[test]
    fn test_non_utf8_header_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );
        assert_eq!(
            auth().authorize(&headers),
            Err(AuthRejection::MissingHeader)
        );
    }

    #[test]
    fn test_not_bearer_scheme() {
        assert_eq!(
            auth().authorize(&headers_with("Basic czNjcjN0")),
            Err(AuthRejection::NotBearer)
        );
        // Scheme match is case-sensitive
        assert_eq!(
            auth().authorize(&headers_with("bearer s3cr3t")),
            Err(AuthRejection::NotBearer)
        );
    }

    #[test]
    fn test_wrong_token() {
        assert_eq!(
            auth().authorize(&headers_with("Bearer wrong")),
            Err(AuthRejection::InvalidToken)
        );
    }

    #[test]
    fn test_empty_token() {
        assert_eq!(
            auth().authorize(&headers_with("Bearer ")),
            Err(AuthRejection::InvalidToken)
        );
        assert_eq!(
            auth().authorize(&headers_with("Bearer")),
            Err(AuthRejection::InvalidToken)
        );
    }

    #[test]
    fn test_only_first_prefix_removed() {
        assert_eq!(
            extract_bearer_token("Bearer Bearer s3cr3t"),
            Some("Bearer s3cr3t".to_string())
        );
        assert_eq!(
            auth().authorize(&headers_with("Bearer Bearer s3cr3t")),
            Err(AuthRejection::InvalidToken)
        );
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc".to_string()));
        assert_eq!(extract_bearer_token("Token abc"), None);
    }
}

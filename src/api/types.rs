//! Shared types for the API layer.

use std::sync::{Arc, Mutex};

use axum::http::{header, HeaderMap};
use rusqlite::Connection;

use crate::pipeline::AuditProcessor;

/// Shared context for all API routes: the audit pipeline plus the report
/// store for the read endpoints.
#[derive(Clone)]
pub struct ApiContext {
    pub processor: Arc<AuditProcessor>,
    pub db: Arc<Mutex<Connection>>,
}

impl ApiContext {
    pub fn new(processor: Arc<AuditProcessor>, db: Arc<Mutex<Connection>>) -> Self {
        Self { processor, db }
    }
}

/// Derive the caller's owner id from the Authorization header, if any.
///
/// The owner id is the SHA-256 of the bearer token, hex encoded. The raw
/// token is never stored or logged; two requests with the same token always
/// map to the same owner.
pub fn owner_from_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(hash_token(token))
}

/// Hash a bearer token with SHA-256, lowercase hex.
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_maps_to_stable_owner_id() {
        let first = owner_from_bearer(&headers_with_auth("Bearer secret-token")).unwrap();
        let second = owner_from_bearer(&headers_with_auth("Bearer secret-token")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, "secret-token");
    }

    #[test]
    fn different_tokens_map_to_different_owners() {
        let a = owner_from_bearer(&headers_with_auth("Bearer token-a")).unwrap();
        let b = owner_from_bearer(&headers_with_auth("Bearer token-b")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn missing_or_malformed_header_is_anonymous() {
        assert!(owner_from_bearer(&HeaderMap::new()).is_none());
        assert!(owner_from_bearer(&headers_with_auth("Basic dXNlcjpwdw==")).is_none());
        assert!(owner_from_bearer(&headers_with_auth("Bearer ")).is_none());
    }

    #[test]
    fn hash_matches_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            hash_token(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

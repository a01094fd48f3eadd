//! Client identification for rate limiting.
//!
//! # Resolution order
//! 1. When API keys are trusted: `X-API-Key` → `key:<first 16 hex chars of
//!    sha256>` (the raw key never reaches the store or the logs)
//! 2. When forwarded headers are trusted: `CF-Connecting-IP`, first entry of
//!    `X-Forwarded-For`, `X-Real-IP`
//! 3. Connection peer address
//! 4. `unknown`
//!
//! # Design Decisions
//! - Both header sources are client-controlled, so each is ignored unless the
//!   deployment opts in. An API key is only a safe identity when something in
//!   front of the gateway has already authenticated it.
//! - Resolution never fails; the worst case is the shared `unknown` bucket

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use std::net::{IpAddr, SocketAddr};

use crate::limiter::UNKNOWN_CLIENT;

pub const API_KEY_HEADER: &str = "x-api-key";

const FORWARDED_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Which client-supplied headers may name the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrustedHeaders {
    pub api_key: bool,
    pub forwarded: bool,
}

pub fn resolve_client_id(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted: TrustedHeaders,
) -> String {
    if trusted.api_key {
        if let Some(key) = header_str(headers, API_KEY_HEADER) {
            return api_key_id(key);
        }
    }

    if trusted.forwarded {
        for name in FORWARDED_HEADERS {
            if let Some(ip) = header_str(headers, name).and_then(first_ip) {
                return ip.to_string();
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// First entry of a comma-separated list, if it is a valid IP.
fn first_ip(value: &str) -> Option<IpAddr> {
    value.split(',').next()?.trim().parse().ok()
}

fn api_key_id(key: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(key.as_bytes()));
    format!("key:{}", &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("192.0.2.7:51234".parse().unwrap())
    }

    const NONE: TrustedHeaders = TrustedHeaders {
        api_key: false,
        forwarded: false,
    };
    const FORWARDED: TrustedHeaders = TrustedHeaders {
        api_key: false,
        forwarded: true,
    };
    const ALL: TrustedHeaders = TrustedHeaders {
        api_key: true,
        forwarded: true,
    };

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_peer_address_by_default() {
        let h = headers(&[("x-forwarded-for", "203.0.113.9")]);
        assert_eq!(resolve_client_id(&h, peer(), NONE), "192.0.2.7");
    }

    #[test]
    fn test_forwarded_precedence_when_trusted() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
            ("x-real-ip", "198.51.100.4"),
        ]);
        assert_eq!(resolve_client_id(&h, peer(), FORWARDED), "203.0.113.9");

        let h = headers(&[
            ("cf-connecting-ip", "2001:db8::1"),
            ("x-forwarded-for", "203.0.113.9"),
        ]);
        assert_eq!(resolve_client_id(&h, peer(), FORWARDED), "2001:db8::1");

        let h = headers(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(resolve_client_id(&h, peer(), FORWARDED), "198.51.100.4");
    }

    #[test]
    fn test_garbage_forwarded_header_skipped() {
        let h = headers(&[("x-forwarded-for", "not-an-ip"), ("x-real-ip", "198.51.100.4")]);
        assert_eq!(resolve_client_id(&h, peer(), FORWARDED), "198.51.100.4");
    }

    #[test]
    fn test_api_key_is_hashed_when_trusted() {
        let h = headers(&[("x-api-key", "secret-token")]);
        let id = resolve_client_id(&h, peer(), ALL);
        assert!(id.starts_with("key:"));
        assert_eq!(id.len(), 4 + 16);
        assert!(!id.contains("secret"));
        assert_eq!(id, resolve_client_id(&h, None, ALL));
    }

    #[test]
    fn test_untrusted_api_keys_collapse_to_peer() {
        let a = headers(&[("x-api-key", "random-1")]);
        let b = headers(&[("x-api-key", "random-2")]);
        assert_eq!(resolve_client_id(&a, peer(), NONE), "192.0.2.7");
        assert_eq!(resolve_client_id(&b, peer(), NONE), "192.0.2.7");

        let a = headers(&[("x-api-key", "random-1"), ("x-real-ip", "198.51.100.4")]);
        assert_eq!(resolve_client_id(&a, peer(), FORWARDED), "198.51.100.4");
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(resolve_client_id(&HeaderMap::new(), None, ALL), UNKNOWN_CLIENT);
        let h = headers(&[("x-api-key", "  ")]);
        assert_eq!(resolve_client_id(&h, None, ALL), UNKNOWN_CLIENT);
    }
}

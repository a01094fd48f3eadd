//! Request matching conditions.
//!
//! # Responsibilities
//! - Match host header (exact match, case-insensitive, port ignored)
//! - Match path prefix (case-sensitive, segment-aware)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

use axum::http::request::Parts;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Parts) -> bool;
}

/// Matches the Host header.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &Parts) -> bool {
        req.headers
            .get("host")
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri.host())
            .map(|h| h.split(':').next().unwrap_or(h).to_lowercase() == self.expected_host)
            .unwrap_or(false)
    }
}

/// Matches the request path prefix on segment boundaries, so `/api/ai`
/// matches `/api/ai` and `/api/ai/picks` but not `/api/aim`.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = match prefix.trim_end_matches('/') {
            "" => "/".to_string(),
            trimmed => trimmed.to_string(),
        };
        Self { prefix }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Parts) -> bool {
        let path = req.uri.path();
        if self.prefix == "/" {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &Parts) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(Body::empty()).unwrap().into_parts().0
    }

    #[test]
    fn test_host_matcher() {
        let matcher = HostMatcher::new("example.com");

        assert!(matcher.matches(&parts(Request::builder().header("Host", "example.com"))));
        assert!(matcher.matches(&parts(Request::builder().header("Host", "EXAMPLE.COM"))));
        assert!(matcher.matches(&parts(Request::builder().header("Host", "example.com:8080"))));
        assert!(!matcher.matches(&parts(Request::builder().header("Host", "other.com"))));
        assert!(!matcher.matches(&parts(Request::builder())));
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api/ai/");

        assert!(matcher.matches(&parts(Request::builder().uri("http://example.com/api/ai"))));
        assert!(matcher.matches(&parts(Request::builder().uri("/api/ai/picks?week=3"))));
        assert!(!matcher.matches(&parts(Request::builder().uri("/api/aim"))));
        assert!(!matcher.matches(&parts(Request::builder().uri("/images"))));
    }

    #[test]
    fn test_root_prefix_matches_everything() {
        let matcher = PathPrefixMatcher::new("/");
        assert!(matcher.matches(&parts(Request::builder().uri("/anything/at/all"))));
    }

    #[test]
    fn test_and_matcher() {
        let matcher = AndMatcher::new(vec![
            Box::new(HostMatcher::new("live.example.com")),
            Box::new(PathPrefixMatcher::new("/scores")),
        ]);
        let hit = Request::builder()
            .uri("/scores/week/1")
            .header("Host", "live.example.com");
        let wrong_host = Request::builder()
            .uri("/scores/week/1")
            .header("Host", "example.com");
        assert!(matcher.matches(&parts(hit)));
        assert!(!matcher.matches(&parts(wrong_host)));
    }
}

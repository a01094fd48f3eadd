//! Rate limit response headers.
//!
//! # Headers
//! - Standard: `RateLimit-Limit`, `RateLimit-Remaining`, `RateLimit-Reset`
//!   (seconds until the window resets)
//! - Legacy: `X-RateLimit-Limit`, `X-RateLimit-Remaining`,
//!   `X-RateLimit-Reset` (epoch seconds)
//! - `Retry-After` on rejections, `X-RateLimit-Degraded` when the store was
//!   unavailable

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::limiter::Decision;

pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
pub const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
pub const X_RATELIMIT_DEGRADED: HeaderName = HeaderName::from_static("x-ratelimit-degraded");

/// Which header families to emit.
#[derive(Debug, Clone, Copy)]
pub struct HeaderStyle {
    pub standard: bool,
    pub legacy: bool,
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            standard: true,
            legacy: false,
        }
    }
}

pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &Decision, style: HeaderStyle) {
    if style.standard {
        headers.insert(RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
        headers.insert(RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
        headers.insert(RATELIMIT_RESET, HeaderValue::from(decision.retry_after_secs()));
    }
    if style.legacy {
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
        headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_epoch_secs()));
    }
    if !decision.allowed {
        headers.insert(RETRY_AFTER, HeaderValue::from(decision.retry_after_secs()));
    }
    if decision.degraded {
        headers.insert(X_RATELIMIT_DEGRADED, HeaderValue::from_static("true"));
    }
}

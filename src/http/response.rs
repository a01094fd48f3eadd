//! Gateway-generated responses.
//!
//! Every error the gateway produces itself (rather than relaying from the
//! upstream) uses the same JSON envelope:
//!
//! ```json
//! {"error": {"code": "...", "message": "...", "details": {...}}, "timestamp": "RFC3339"}
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;

use crate::limiter::Decision;

pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";
pub const UPSTREAM_UNAVAILABLE: &str = "UPSTREAM_UNAVAILABLE";
pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
pub const STORE_UNAVAILABLE: &str = "STORE_UNAVAILABLE";

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<D: Serialize> {
    pub error: ErrorBody<D>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<D: Serialize> {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<D>,
}

#[derive(Debug, Serialize)]
pub struct RateLimitDetails {
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: String,
    pub retry_after: u64,
}

fn rfc3339(ms: u64) -> String {
    let at: DateTime<Utc> = i64::try_from(ms)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_default();
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 429 body for a rejected decision. Headers are added by the caller.
pub fn rate_limited(decision: &Decision, message: &str) -> Response {
    let body = ErrorEnvelope {
        error: ErrorBody {
            code: RATE_LIMIT_EXCEEDED,
            message: message.to_string(),
            details: Some(RateLimitDetails {
                limit: decision.limit,
                remaining: decision.remaining,
                reset_at: rfc3339(decision.reset_at_ms),
                retry_after: decision.retry_after_secs(),
            }),
        },
        timestamp: rfc3339(decision.decided_at_ms),
    };
    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
}

/// Error response without details, stamped with the current time.
pub fn gateway_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    let body: ErrorEnvelope<()> = ErrorEnvelope {
        error: ErrorBody {
            code,
            message: message.into(),
            details: None,
        },
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    (status, Json(body)).into_response()
}

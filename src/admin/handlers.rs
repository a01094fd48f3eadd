use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::RateLimitConfig;
use crate::http::response::{self, STORE_UNAVAILABLE};
use crate::http::server::AppState;
use crate::limiter::{EndpointClass, RateLimitKey, WindowPolicy};
use crate::observability::monitor::{hour_of, UsageReport};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub limiter_enabled: bool,
    pub store_backend: &'static str,
    pub policy: WindowPolicy,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsageQuery {
    /// Hours since the Unix epoch; the current hour when absent.
    pub hour: Option<u64>,
}

/// Body of `POST /admin/reset`. `client` is a resolved client id, as shown
/// in `/admin/usage` (an IP address or `key:<hash>`).
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub client: String,
    pub class: EndpointClass,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub reset: bool,
    pub client: String,
    pub class: EndpointClass,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let limiter = &state.rate_limit.limiter;
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        limiter_enabled: state.rate_limit.settings.enabled,
        store_backend: limiter.backend(),
        policy: limiter.policy(),
    })
}

pub async fn get_limits(
    State(state): State<AppState>,
) -> Json<BTreeMap<&'static str, RateLimitConfig>> {
    let limits = &state.rate_limit.limits;
    Json(
        EndpointClass::ALL
            .into_iter()
            .map(|class| (class.as_str(), limits.for_class(class).clone()))
            .collect(),
    )
}

pub async fn get_usage(
    State(state): State<AppState>,
    Query(query): Query<UsageQuery>,
) -> Json<Vec<UsageReport>> {
    let hour = query.hour.unwrap_or_else(|| hour_of(state.clock.now_ms()));
    Json(state.rate_limit.monitor.snapshot(Some(hour)))
}

pub async fn get_alerts(State(state): State<AppState>) -> Json<Vec<UsageReport>> {
    Json(state.rate_limit.monitor.alerts(state.clock.now_ms()))
}

pub async fn post_reset(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Response {
    let key = RateLimitKey::new(request.client, request.class);
    let window_ms = state.rate_limit.limits.for_class(request.class).window_ms;

    match state.rate_limit.limiter.reset(&key, window_ms).await {
        Ok(()) => Json(ResetResponse {
            reset: true,
            client: key.client().to_string(),
            class: key.class(),
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(client = %key.client(), class = %key.class(), error = %e, "Failed to reset counters");
            response::gateway_error(
                StatusCode::SERVICE_UNAVAILABLE,
                STORE_UNAVAILABLE,
                "Counter store unavailable",
            )
        }
    }
}

//! Rate limiting middleware.
//!
//! # Data Flow
//! ```text
//! Request
//!     → classify (EndpointClass)
//!     → resolve client id
//!     → allowlisted: next.run()
//!     → RateLimiter::check
//!     → monitor + metrics
//!     → allowed: next.run() + headers
//!     → rejected: 429 + headers
//! ```
//!
//! The [`Decision`] and [`EndpointClass`] are inserted into the request
//! extensions so downstream handlers can read them.
//!
//! `gateway_requests_total` is recorded here, once the final response
//! exists, so 429s and admin responses are counted alongside forwarded
//! traffic.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{LimiterConfig, LimitsConfig};
use crate::http::response;
use crate::limiter::{Decision, EndpointClass, RateLimitKey, RateLimiter};
use crate::observability::{metrics, RateLimitMonitor};
use crate::routing::Classifier;
use crate::security::client_id::{resolve_client_id, TrustedHeaders};
use crate::security::headers::{apply_rate_limit_headers, HeaderStyle};

/// Everything the middleware needs, built once at startup.
#[derive(Debug)]
pub struct RateLimitState {
    pub limiter: RateLimiter,
    pub classifier: Classifier,
    pub limits: LimitsConfig,
    pub settings: LimiterConfig,
    pub monitor: Arc<RateLimitMonitor>,
}

impl RateLimitState {
    fn header_style(&self) -> HeaderStyle {
        HeaderStyle {
            standard: self.settings.standard_headers,
            legacy: self.settings.legacy_headers,
        }
    }

    fn trusted_headers(&self) -> TrustedHeaders {
        TrustedHeaders {
            api_key: self.settings.trust_api_key_header,
            forwarded: self.settings.trust_forwarded_headers,
        }
    }

    pub fn is_allowlisted(&self, client: &str) -> bool {
        self.settings.allowlist.iter().any(|c| c == client)
    }
}

pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    let (mut parts, body) = request.into_parts();
    let class = state.classifier.classify(&parts);
    parts.extensions.insert(class);
    let request = Request::from_parts(parts, body);

    let response = enforce(&state, class, request, next).await;
    metrics::record_request(method.as_str(), response.status().as_u16(), class, start);
    response
}

async fn enforce(
    state: &RateLimitState,
    class: EndpointClass,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if !state.settings.enabled {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = resolve_client_id(request.headers(), peer, state.trusted_headers());

    if state.is_allowlisted(&client) {
        tracing::trace!(client = %client, class = %class, "Allowlisted client, not counted");
        return next.run(request).await;
    }

    let config = state.limits.for_class(class);
    let key = RateLimitKey::new(client, class);
    let decision = state.limiter.check(&key, config).await;

    state.monitor.record(
        class,
        key.client(),
        !decision.allowed,
        decision.remaining,
        decision.decided_at_ms,
    );
    metrics::record_decision(class, &decision);

    let mut response = if decision.allowed {
        request.extensions_mut().insert::<Decision>(decision);
        next.run(request).await
    } else {
        tracing::warn!(
            client = %key.client(),
            class = %class,
            path = %request.uri().path(),
            limit = decision.limit,
            retry_after = decision.retry_after_secs(),
            "Rate limit exceeded"
        );
        response::rate_limited(&decision, &config.message)
    };

    apply_rate_limit_headers(response.headers_mut(), &decision, state.header_style());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{schema::default_routes, RateLimitConfig};
    use crate::limiter::{EndpointClass, MockClock};
    use crate::store::MemoryStore;
    use axum::{
        body::to_bytes, http::StatusCode,
        middleware::from_fn_with_state, routing::get, Extension, Router,
    };
    use tower::ServiceExt;

    fn state(settings: LimiterConfig) -> Arc<RateLimitState> {
        let clock = Arc::new(MockClock::new(1_000));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let mut limits = LimitsConfig::default();
        limits.auth = RateLimitConfig::new(2, 60_000, "slow down");
        Arc::new(RateLimitState {
            limiter: RateLimiter::new(store, clock),
            classifier: Classifier::from_config(&default_routes()),
            limits,
            settings,
            monitor: Arc::new(RateLimitMonitor::new()),
        })
    }

    fn app(state: Arc<RateLimitState>) -> Router {
        Router::new()
            .route("/api/auth/login", get(|| async { "ok" }))
            .route(
                "/api/leagues",
                get(|Extension(d): Extension<Decision>| async move { d.remaining.to_string() }),
            )
            .layer(from_fn_with_state(state, rate_limit_middleware))
            .layer(Extension(ConnectInfo(SocketAddr::from(([203, 0, 113, 5], 4000)))))
    }

    fn get_req(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    fn keyed_req(path: &str, api_key: String) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header("x-api-key", api_key)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_rejects_after_quota() {
        let state = state(LimiterConfig::default());
        let app = app(state.clone());

        for expected_remaining in ["1", "0"] {
            let res = app.clone().oneshot(get_req("/api/auth/login")).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            assert_eq!(res.headers()["ratelimit-remaining"], expected_remaining);
            assert_eq!(res.headers()["ratelimit-limit"], "2");
        }

        let res = app.clone().oneshot(get_req("/api/auth/login")).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()["retry-after"], "59");

        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["message"], "slow down");

        let report = &state.monitor.snapshot(None)[0];
        assert_eq!(report.class, EndpointClass::Auth);
        assert_eq!(report.total_requests, 3);
        assert_eq!(report.blocked_requests, 1);
        assert_eq!(report.top_clients[0].client, "203.0.113.5");
    }

    #[tokio::test]
    async fn test_classes_are_independent() {
        let app = app(state(LimiterConfig::default()));

        for _ in 0..3 {
            app.clone().oneshot(get_req("/api/auth/login")).await.unwrap();
        }
        let res = app.oneshot(get_req("/api/leagues")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"99");
    }

    #[tokio::test]
    async fn test_disabled_passes_through() {
        let settings = LimiterConfig {
            enabled: false,
            ..LimiterConfig::default()
        };
        let app = app(state(settings));

        for _ in 0..5 {
            let res = app.clone().oneshot(get_req("/api/auth/login")).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            assert!(res.headers().get("ratelimit-limit").is_none());
        }
    }

    #[tokio::test]
    async fn test_legacy_headers() {
        let settings = LimiterConfig {
            standard_headers: false,
            legacy_headers: true,
            ..LimiterConfig::default()
        };
        let app = app(state(settings));

        let res = app.oneshot(get_req("/api/auth/login")).await.unwrap();
        assert_eq!(res.headers()["x-ratelimit-limit"], "2");
        assert_eq!(res.headers()["x-ratelimit-reset"], "60");
        assert!(res.headers().get("ratelimit-limit").is_none());
    }

    #[tokio::test]
    async fn test_rotating_api_keys_share_peer_quota() {
        let app = app(state(LimiterConfig::default()));

        let mut allowed = 0;
        for i in 0..20 {
            let req = keyed_req("/api/auth/login", format!("random-{}", i));
            if app.clone().oneshot(req).await.unwrap().status() == StatusCode::OK {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 2);
    }

    #[tokio::test]
    async fn test_trusted_api_keys_are_separate_clients() {
        let settings = LimiterConfig {
            trust_api_key_header: true,
            ..LimiterConfig::default()
        };
        let app = app(state(settings));

        for _ in 0..3 {
            app.clone()
                .oneshot(keyed_req("/api/auth/login", "alpha".into()))
                .await
                .unwrap();
        }
        let res = app
            .clone()
            .oneshot(keyed_req("/api/auth/login", "alpha".into()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

        let res = app
            .oneshot(keyed_req("/api/auth/login", "bravo".into()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_allowlisted_client_is_not_counted() {
        let settings = LimiterConfig {
            allowlist: vec!["203.0.113.5".into()],
            ..LimiterConfig::default()
        };
        let state = state(settings);
        let app = app(state.clone());

        for _ in 0..10 {
            let res = app.clone().oneshot(get_req("/api/auth/login")).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            assert!(res.headers().get("ratelimit-limit").is_none());
        }
        assert!(state.monitor.snapshot(None).is_empty());
    }

    #[test]
    fn test_rejections_are_counted_as_requests() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            rt.block_on(async {
                let app = app(state(LimiterConfig::default()));
                for _ in 0..3 {
                    app.clone().oneshot(get_req("/api/auth/login")).await.unwrap();
                }
            })
        });

        let rendered = handle.render();
        let series = |status: &str| {
            rendered
                .lines()
                .find(|l| {
                    l.starts_with("gateway_requests_total{")
                        && l.contains(&format!("status=\"{}\"", status))
                        && l.contains("class=\"auth\"")
                })
                .map(|l| l.rsplit(' ').next().unwrap_or_default().to_string())
        };
        assert_eq!(series("200").as_deref(), Some("2"));
        assert_eq!(series("429").as_deref(), Some("1"));
        assert!(rendered.contains("gateway_request_duration_seconds"));
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::limiter::{EndpointClass, WindowPolicy};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Application the gateway forwards admitted requests to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Limiter behaviour (policy, headers, client identification).
    pub limiter: LimiterConfig,

    /// Counter store backend.
    pub store: StoreConfig,

    /// Quota per endpoint class.
    pub limits: LimitsConfig,

    /// Endpoint classification rules.
    pub routes: Vec<RouteConfig>,

    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            timeouts: TimeoutConfig::default(),
            limiter: LimiterConfig::default(),
            store: StoreConfig::default(),
            limits: LimitsConfig::default(),
            routes: default_routes(),
            admin: AdminConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream application.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000"). Without one, admitted
    /// requests are answered with 503.
    pub address: Option<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiter behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Enable rate limiting. When false every request passes through.
    pub enabled: bool,

    /// Window boundary behaviour.
    pub policy: WindowPolicy,

    /// Read the client address from CF-Connecting-IP / X-Forwarded-For /
    /// X-Real-IP. Only safe behind a trusted proxy.
    pub trust_forwarded_headers: bool,

    /// Key clients on a hash of `X-API-Key`. Off by default: any caller can
    /// send fresh keys, so only enable this when an upstream proxy has
    /// already authenticated the key.
    pub trust_api_key_header: bool,

    /// Client ids that are never counted or limited (e.g. "10.0.0.5" or
    /// "key:0123456789abcdef").
    pub allowlist: Vec<String>,

    /// Emit `RateLimit-*` headers.
    pub standard_headers: bool,

    /// Emit `X-RateLimit-*` headers.
    pub legacy_headers: bool,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: WindowPolicy::Fixed,
            trust_forwarded_headers: false,
            trust_api_key_header: false,
            allowlist: Vec::new(),
            standard_headers: true,
            legacy_headers: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

/// Counter store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Redis connection URL (used when backend = "redis").
    pub redis_url: String,

    /// Prefix of every counter key.
    pub key_prefix: String,

    /// Deadline for one store operation before failing open.
    pub operation_timeout_ms: u64,

    /// Interval of the background sweep (memory store, usage monitor).
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1/".to_string(),
            key_prefix: "ratelimit".to_string(),
            operation_timeout_ms: 50,
            sweep_interval_secs: 30,
        }
    }
}

/// Quota for one endpoint class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests admitted per window.
    pub max_requests: u64,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Message returned in the 429 body.
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_message() -> String {
    "Rate limit exceeded, please try again later".to_string()
}

impl RateLimitConfig {
    pub fn new(max_requests: u64, window_ms: u64, message: impl Into<String>) -> Self {
        Self {
            max_requests,
            window_ms,
            message: message.into(),
        }
    }
}

/// Quota table, one entry per [`EndpointClass`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub auth: RateLimitConfig,
    pub ai: RateLimitConfig,
    pub general: RateLimitConfig,
    pub live: RateLimitConfig,
    pub admin: RateLimitConfig,
    pub websocket: RateLimitConfig,
}

impl LimitsConfig {
    pub fn for_class(&self, class: EndpointClass) -> &RateLimitConfig {
        match class {
            EndpointClass::Auth => &self.auth,
            EndpointClass::Ai => &self.ai,
            EndpointClass::General => &self.general,
            EndpointClass::Live => &self.live,
            EndpointClass::Admin => &self.admin,
            EndpointClass::WebSocket => &self.websocket,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            auth: RateLimitConfig::new(
                5,
                60_000,
                "Too many authentication attempts, please try again later",
            ),
            ai: RateLimitConfig::new(
                30,
                60_000,
                "AI service rate limit exceeded, please try again later",
            ),
            general: RateLimitConfig::new(100, 60_000, "Too many requests, please slow down"),
            live: RateLimitConfig::new(
                50,
                10_000,
                "Live data rate limit exceeded, please try again later",
            ),
            admin: RateLimitConfig::new(1_000, 60_000, default_message()),
            websocket: RateLimitConfig::new(10, 60_000, "WebSocket connection limit exceeded"),
        }
    }
}

/// Rule assigning matching requests to an endpoint class.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Rule identifier for logging.
    pub name: String,

    /// Host header to match (exact match).
    pub host: Option<String>,

    /// Path prefix to match.
    pub path_prefix: Option<String>,

    /// Class assigned on match.
    pub class: EndpointClass,

    /// Rule priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}

impl RouteConfig {
    pub fn prefix(name: &str, path_prefix: &str, class: EndpointClass) -> Self {
        Self {
            name: name.to_string(),
            host: None,
            path_prefix: Some(path_prefix.to_string()),
            class,
            priority: 0,
        }
    }
}

pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::prefix("auth", "/api/auth", EndpointClass::Auth),
        RouteConfig::prefix("ai", "/api/ai", EndpointClass::Ai),
        RouteConfig::prefix("live", "/api/live", EndpointClass::Live),
        RouteConfig::prefix("admin", "/admin", EndpointClass::Admin),
    ]
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin API under /admin.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

//! Rate limiting gateway library.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ security::rate_limit ──▶ http::forward ──▶ Upstream
//!                                          │        │
//!                                          │        └─▶ routing::Classifier (endpoint class)
//!                                          ▼
//!                                     limiter::RateLimiter
//!                                          │
//!                                          ▼
//!                                     store::CounterStore (memory | redis)
//!
//!     Cross-cutting: config, observability (logs, metrics, usage monitor),
//!                    admin API, lifecycle (signals, shutdown)
//! ```

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod limiter;
pub mod observability;
pub mod routing;
pub mod security;
pub mod store;

pub use config::schema::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use limiter::{Decision, RateLimiter};

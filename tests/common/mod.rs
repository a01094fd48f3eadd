//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use axum::{http::StatusCode, http::Uri, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use ratelimit_gateway::config::{GatewayConfig, RateLimitConfig};
use ratelimit_gateway::limiter::{Clock, MockClock};
use ratelimit_gateway::store::{MemoryStore, StoreHandle};
use ratelimit_gateway::{GatewayServer, Shutdown};

pub const ADMIN_KEY: &str = "test-admin-key";

/// 20s into a one-minute window.
pub const START_MS: u64 = 1_700_000_000_000;

pub struct TestGateway {
    pub addr: SocketAddr,
    pub clock: Arc<MockClock>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start an upstream answering `200 upstream:<path>`.
pub async fn start_mock_upstream() -> SocketAddr {
    start_programmable_upstream(|path| async move { (200, format!("upstream:{}", path)) }).await
}

/// Start an upstream whose status and body are computed per request path.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    let app = Router::new().fallback(move |uri: Uri| {
        let f = f.clone();
        async move {
            let (status, body) = f(uri.path().to_string()).await;
            (StatusCode::from_u16(status).unwrap(), body)
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Defaults plus: admin API on, metrics off, auth limited to 3 per minute.
pub fn test_config(upstream: Option<SocketAddr>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.address = upstream.map(|addr| addr.to_string());
    config.observability.metrics_enabled = false;
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config.limits.auth = RateLimitConfig::new(3, 60_000, "Too many authentication attempts");
    config
}

/// Start a gateway over an in-memory store driven by a mock clock.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let clock = Arc::new(MockClock::new(START_MS));
    let store = StoreHandle::Memory(MemoryStore::with_clock(clock.clone()));
    start_gateway_with(config, store, clock).await
}

pub async fn start_gateway_with(
    config: GatewayConfig,
    store: StoreHandle,
    clock: Arc<MockClock>,
) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = GatewayServer::new(config, store, clock.clone() as Arc<dyn Clock>);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestGateway {
        addr,
        clock,
        shutdown,
        handle,
    }
}

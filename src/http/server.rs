//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the counter store, limiter and classifier from config
//! - Create the Axum router (health, admin, forwarding fallback)
//! - Wire up middleware (request ID, tracing, timeout, rate limiting)
//! - Run the background sweeper (expired windows, old usage buckets)
//! - Serve until the shutdown signal fires

use axum::{
    http::uri::Authority,
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::GatewayConfig;
use crate::http::forward::forward_handler;
use crate::limiter::{Clock, RateLimiter, SystemClock};
use crate::observability::RateLimitMonitor;
use crate::routing::Classifier;
use crate::security::{rate_limit_middleware, RateLimitState};
use crate::store::StoreHandle;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub rate_limit: Arc<RateLimitState>,
    pub clock: Arc<dyn Clock>,
    pub upstream: Option<Authority>,
    pub client: Client<HttpConnector, axum::body::Body>,
}

/// HTTP server for the rate limiting gateway.
pub struct GatewayServer {
    router: Router,
    state: AppState,
    store: StoreHandle,
}

impl GatewayServer {
    /// Build the server, connecting to the configured counter store.
    pub async fn from_config(config: GatewayConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let store = StoreHandle::from_config(&config.store, clock.clone()).await;
        Self::new(config, store, clock)
    }

    /// Build the server over an existing store and clock.
    pub fn new(config: GatewayConfig, store: StoreHandle, clock: Arc<dyn Clock>) -> Self {
        let limiter = RateLimiter::new(store.counter_store(), clock.clone())
            .with_policy(config.limiter.policy)
            .with_key_prefix(config.store.key_prefix.clone())
            .with_store_timeout(Duration::from_millis(config.store.operation_timeout_ms));

        tracing::info!(
            backend = limiter.backend(),
            policy = ?limiter.policy(),
            enabled = config.limiter.enabled,
            "Rate limiter initialized"
        );

        let rate_limit = Arc::new(RateLimitState {
            limiter,
            classifier: Classifier::from_config(&config.routes),
            limits: config.limits.clone(),
            settings: config.limiter.clone(),
            monitor: Arc::new(RateLimitMonitor::new()),
        });

        let upstream = config
            .upstream
            .address
            .as_deref()
            .and_then(|addr| Authority::from_str(addr).ok());

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            config: Arc::new(config),
            rate_limit,
            clock,
            upstream,
            client,
        };

        let router = Self::build_router(state.clone());
        Self {
            router,
            state,
            store,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let mut app: Router<AppState> = Router::new();
        if state.config.admin.enabled {
            app = app.merge(setup_admin_router(state.clone()));
        }

        app.fallback(forward_handler)
            .with_state(state.clone())
            .layer(from_fn_with_state(
                state.rate_limit.clone(),
                rate_limit_middleware,
            ))
            // Health checks bypass the limiter.
            .route("/health", get(health_handler))
            .layer(TimeoutLayer::new(Duration::from_secs(
                state.config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = tokio::spawn(sweep(
            self.store.clone(),
            self.state.rate_limit.monitor.clone(),
            self.state.clock.clone(),
            Duration::from_secs(self.state.config.store.sweep_interval_secs.max(1)),
            shutdown.resubscribe(),
        ));

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Periodic cleanup until shutdown.
async fn sweep(
    store: StoreHandle,
    monitor: Arc<RateLimitMonitor>,
    clock: Arc<dyn Clock>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let windows = store.sweep();
                let buckets = monitor.cleanup(clock.now_ms());
                tracing::debug!(windows, buckets, "Sweep complete");
            }
            _ = shutdown.recv() => break,
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health_handler() -> Json<Health> {
    Json(Health { status: "ok" })
}

//! The rate limiter itself.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RateLimitConfig;
use crate::limiter::{Clock, Decision, RateLimitKey, Window, WindowPolicy};
use crate::observability::metrics;
use crate::store::{CounterStore, StoreError, StoreResult};

pub const DEFAULT_KEY_PREFIX: &str = "ratelimit";
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(50);

/// Windowed request counter over an injected [`CounterStore`].
///
/// Cheap to share behind an `Arc`; holds no locks of its own.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    policy: WindowPolicy,
    key_prefix: String,
    store_timeout: Duration,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("backend", &self.store.backend())
            .field("policy", &self.policy)
            .field("key_prefix", &self.key_prefix)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            policy: WindowPolicy::default(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_policy(mut self, policy: WindowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Count this request against `key` and decide whether it may proceed.
    ///
    /// The request is counted whether or not it is allowed. Store errors and
    /// timeouts are not retried: they produce an allowed, `degraded` decision.
    pub async fn check(&self, key: &RateLimitKey, config: &RateLimitConfig) -> Decision {
        let now_ms = self.clock.now_ms();
        let window = Window::at(now_ms, config.window_ms);

        match self.observe(key, &window, config.window_ms).await {
            Ok((count, previous)) => {
                let weight = window.previous_weight(now_ms);
                let tally = self.policy.tally(config.max_requests, count, previous, weight);
                Decision {
                    allowed: tally.allowed,
                    limit: config.max_requests,
                    remaining: tally.remaining,
                    reset_at_ms: window.end_ms,
                    decided_at_ms: now_ms,
                    count,
                    degraded: false,
                }
            }
            Err(e) => {
                tracing::warn!(
                    backend = self.store.backend(),
                    client = %key.client(),
                    class = %key.class(),
                    error = %e,
                    "Counter store failed, allowing request"
                );
                metrics::record_store_error(self.store.backend(), e.kind());
                Decision::degraded(config.max_requests, now_ms, window.end_ms)
            }
        }
    }

    /// Forget everything counted against `key` in the current and previous
    /// window, so the client starts over with a full quota.
    pub async fn reset(&self, key: &RateLimitKey, window_ms: u64) -> StoreResult<()> {
        let window = Window::at(self.clock.now_ms(), window_ms);
        let current_key = key.storage_key(&self.key_prefix, window.id);
        self.bounded(self.store.delete(&current_key)).await?;
        if let Some(prev_id) = window.previous_id() {
            let prev_key = key.storage_key(&self.key_prefix, prev_id);
            self.bounded(self.store.delete(&prev_key)).await?;
        }
        tracing::info!(client = %key.client(), class = %key.class(), "Rate limit counters reset");
        Ok(())
    }

    /// Returns (current count including this request, previous window count).
    async fn observe(
        &self,
        key: &RateLimitKey,
        window: &Window,
        window_ms: u64,
    ) -> StoreResult<(u64, u64)> {
        // Two windows' worth so the sliding policy can still read the
        // previous one.
        let ttl = Duration::from_millis(window_ms.saturating_mul(2));
        let current_key = key.storage_key(&self.key_prefix, window.id);

        let count = self.bounded(self.store.increment(&current_key, ttl)).await?;

        let previous = match (self.policy, window.previous_id()) {
            (WindowPolicy::Sliding, Some(prev_id)) => {
                let prev_key = key.storage_key(&self.key_prefix, prev_id);
                self.bounded(self.store.get(&prev_key)).await?.unwrap_or(0)
            }
            _ => 0,
        };

        Ok((count, previous))
    }

    async fn bounded<T>(&self, op: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        match tokio::time::timeout(self.store_timeout, op).await {
            Ok(res) => res,
            Err(_) => Err(StoreError::Timeout(self.store_timeout)),
        }
    }
}

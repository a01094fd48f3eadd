//! Shared counter storage.
//!
//! # Data Flow
//! ```text
//! RateLimiter::check
//!     → CounterStore::increment(key, ttl)   (atomic INCR + expiry)
//!     → CounterStore::get(previous key)     (sliding policy only)
//!
//! RateLimiter::reset (admin)
//!     → CounterStore::delete(current and previous key)
//!
//! Backends:
//!     memory.rs  DashMap, single instance, background sweep
//!     redis.rs   MULTI/EXEC of INCR + PEXPIRE, shared across instances
//! ```
//!
//! # Design Decisions
//! - The increment is the only counting write; `delete` exists for operator
//!   resets. No read-then-write anywhere
//! - Expiry belongs to the store (TTL), never to the limiter
//! - Errors are returned, not swallowed; the limiter decides to fail open

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};
use crate::limiter::Clock;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

impl StoreError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Timeout(_) => "timeout",
            StoreError::Redis(_) => "redis",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Atomic counter storage keyed by window.
#[async_trait]
pub trait CounterStore: Send + Sync + std::fmt::Debug {
    /// Increment `key` by one and return the new value.
    ///
    /// A key that is absent or expired starts from zero. `ttl` is applied to
    /// the key so the store can drop it once the window is over.
    async fn increment(&self, key: &str, ttl: Duration) -> StoreResult<u64>;

    /// Current value of `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<u64>>;

    /// Remove `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Backend label for logs and metrics.
    fn backend(&self) -> &'static str;
}

/// Upper bound on the startup connection attempt, retries included.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// The configured backend, kept concrete so the sweeper can reach the
/// in-memory store.
#[derive(Debug, Clone)]
pub enum StoreHandle {
    Memory(MemoryStore),
    Redis(RedisStore),
    /// Any other implementation, supplied by the embedding application.
    External(Arc<dyn CounterStore>),
}

impl StoreHandle {
    /// Build the configured backend.
    ///
    /// A Redis backend that cannot be reached at startup is replaced by an
    /// in-memory store so the gateway still enforces per-instance limits.
    pub async fn from_config(config: &StoreConfig, clock: Arc<dyn Clock>) -> Self {
        match config.backend {
            StoreBackend::Memory => StoreHandle::Memory(MemoryStore::with_clock(clock)),
            StoreBackend::Redis => {
                let connected =
                    match tokio::time::timeout(CONNECT_TIMEOUT, RedisStore::connect(&config.redis_url))
                        .await
                    {
                        Ok(Ok(store)) => store.ping().await.map(|_| store),
                        Ok(Err(e)) => Err(e),
                        Err(_) => Err(StoreError::Timeout(CONNECT_TIMEOUT)),
                    };
                match connected {
                    Ok(store) => StoreHandle::Redis(store),
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "Redis counter store unreachable, falling back to in-memory store"
                        );
                        StoreHandle::Memory(MemoryStore::with_clock(clock))
                    }
                }
            }
        }
    }

    pub fn counter_store(&self) -> Arc<dyn CounterStore> {
        match self {
            StoreHandle::Memory(store) => Arc::new(store.clone()),
            StoreHandle::Redis(store) => Arc::new(store.clone()),
            StoreHandle::External(store) => store.clone(),
        }
    }

    /// Drop expired in-memory windows. Other backends expire keys themselves.
    pub fn sweep(&self) -> usize {
        match self {
            StoreHandle::Memory(store) => store.purge_expired(),
            StoreHandle::Redis(_) | StoreHandle::External(_) => 0,
        }
    }
}

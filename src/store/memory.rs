//! Process-local counter store.
//!
//! Used for single-instance deployments, for tests, and as the fallback when
//! Redis cannot be reached at startup.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::limiter::{Clock, SystemClock};
use crate::store::{CounterStore, StoreResult};

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u64,
    expires_at_ms: u64,
}

/// A `DashMap` of counters with per-key deadlines.
///
/// `increment` holds the shard lock for the key for the whole
/// read-modify-write, so concurrent increments never lose an update.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.inner.len();
        self.inner.retain(|_, entry| entry.expires_at_ms > now);
        let removed = before.saturating_sub(self.inner.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.inner.len(), "Purged expired counters");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &str, ttl: Duration) -> StoreResult<u64> {
        let now = self.clock.now_ms();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let expires_at_ms = now.saturating_add(ttl_ms);

        let mut entry = self
            .inner
            .entry(key.to_string())
            .or_insert(Entry { count: 0, expires_at_ms });

        if entry.expires_at_ms <= now {
            entry.count = 0;
        }
        entry.count += 1;
        entry.expires_at_ms = expires_at_ms;
        Ok(entry.count)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<u64>> {
        let now = self.clock.now_ms();
        Ok(self
            .inner
            .get(key)
            .filter(|e| e.expires_at_ms > now)
            .map(|e| e.count))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

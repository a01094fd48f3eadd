//! Redis-backed counter store.
//!
//! Lets every gateway instance share one set of counters. The increment is
//! sent as a `MULTI`/`EXEC` transaction:
//!
//! ```text
//! MULTI
//! INCR    <key>
//! PEXPIRE <key> <ttl_ms>
//! EXEC
//! ```
//!
//! so the counter and its expiry are set together and the returned value is
//! the post-increment count seen by exactly one caller.
//!
//! `ConnectionManager` reconnects in the background; while it is down,
//! commands fail fast and the limiter takes the fail-open path.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::fmt;
use std::time::Duration;

use crate::store::{CounterStore, StoreResult};

/// Upper bound on a counter's expiry (about a century). `PEXPIRE` rejects
/// deadlines that overflow once added to the server clock.
const MAX_TTL_MS: i64 = 100 * 365 * 24 * 3_600 * 1_000;

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the first connection fails.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis counter store");
        Ok(Self { connection })
    }

    /// Round-trip a `PING`.
    pub async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn increment(&self, key: &str, ttl: Duration) -> StoreResult<u64> {
        let mut conn = self.connection.clone();
        let ttl_ms = i64::try_from(ttl.as_millis())
            .unwrap_or(MAX_TTL_MS)
            .clamp(1, MAX_TTL_MS);

        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(key, 1u64)
            .pexpire(key, ttl_ms)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<u64>> {
        let mut conn = self.connection.clone();
        let value: Option<u64> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        let _removed: u64 = conn.del(key).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_cap_fits_redis_clock() {
        let now_ms = 1_700_000_000_000i64;
        assert!(now_ms.checked_add(MAX_TTL_MS).is_some());
    }
}

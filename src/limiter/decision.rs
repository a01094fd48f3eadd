//! Per-request verdict.

use serde::Serialize;

/// Result of one [`RateLimiter::check`](crate::limiter::RateLimiter::check).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Quota of the applied config.
    pub limit: u64,
    /// Requests left in the current window after this one.
    pub remaining: u64,
    /// End of the current window, ms since the Unix epoch.
    pub reset_at_ms: u64,
    /// Clock reading the decision was derived from.
    pub decided_at_ms: u64,
    /// Post-increment count of the current window (0 when degraded).
    pub count: u64,
    /// True when the store failed and the request was let through anyway.
    pub degraded: bool,
}

impl Decision {
    /// Fail-open verdict used when the counter store is unreachable.
    pub fn degraded(limit: u64, decided_at_ms: u64, reset_at_ms: u64) -> Self {
        Self {
            allowed: true,
            limit,
            remaining: limit,
            reset_at_ms,
            decided_at_ms,
            count: 0,
            degraded: true,
        }
    }

    /// Whole seconds until the window resets, never less than one.
    pub fn retry_after_secs(&self) -> u64 {
        let ms = self.reset_at_ms.saturating_sub(self.decided_at_ms);
        ms.div_ceil(1000).max(1)
    }

    /// Window end as whole epoch seconds, rounded up.
    pub fn reset_epoch_secs(&self) -> u64 {
        self.reset_at_ms.div_ceil(1000)
    }
}

//! Window arithmetic and the two counting policies.
//!
//! # Boundary behaviour
//! - `Fixed`: the count resets to zero at every window boundary. A client can
//!   spend a full quota at the end of one window and another at the start of
//!   the next.
//! - `Sliding`: the previous window's count is blended in, weighted by how
//!   much of the previous window still overlaps the trailing `window_ms`.
//!   At the boundary the weight is 1 and decays linearly to 0 at window end.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    #[default]
    Fixed,
    Sliding,
}

/// A single window derived from one clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub id: u64,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Window {
    /// `window_ms` must be non-zero; config validation guarantees it.
    pub fn at(now_ms: u64, window_ms: u64) -> Self {
        let window_ms = window_ms.max(1);
        let id = now_ms / window_ms;
        let start_ms = id * window_ms;
        Self {
            id,
            start_ms,
            end_ms: start_ms.saturating_add(window_ms),
        }
    }

    /// Id of the window immediately before this one, if any.
    pub fn previous_id(&self) -> Option<u64> {
        self.id.checked_sub(1)
    }

    /// Share of the previous window still inside the trailing interval.
    pub fn previous_weight(&self, now_ms: u64) -> f64 {
        let len = (self.end_ms - self.start_ms) as f64;
        let elapsed = now_ms.saturating_sub(self.start_ms) as f64;
        (1.0 - elapsed / len).clamp(0.0, 1.0)
    }
}

/// Outcome of applying a policy to observed counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub allowed: bool,
    pub remaining: u64,
}

impl WindowPolicy {
    /// `count` includes the request being decided. `previous` is only read
    /// by the sliding policy.
    pub fn tally(&self, max_requests: u64, count: u64, previous: u64, weight: f64) -> Tally {
        let seen_before = count.saturating_sub(1);
        match self {
            WindowPolicy::Fixed => Tally {
                allowed: seen_before < max_requests,
                remaining: max_requests.saturating_sub(count),
            },
            WindowPolicy::Sliding => {
                let carried = (previous as f64 * weight).floor() as u64;
                let estimate = carried.saturating_add(seen_before);
                Tally {
                    allowed: estimate < max_requests,
                    remaining: max_requests.saturating_sub(estimate.saturating_add(1)),
                }
            }
        }
    }
}

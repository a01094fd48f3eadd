//! Hourly usage accounting for the admin API.
//!
//! Keeps, per endpoint class and clock hour, how many requests were seen,
//! how many were rejected, the running mean of remaining quota, and the
//! busiest clients. Buckets older than [`RETENTION_HOURS`] are dropped by
//! [`RateLimitMonitor::cleanup`].

use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;

use crate::limiter::EndpointClass;

pub const HOUR_MS: u64 = 3_600_000;
pub const RETENTION_HOURS: u64 = 24;
pub const TOP_CLIENTS: usize = 10;
/// Per-bucket cap on individually tracked clients. Past it, a new client
/// replaces the least busy one and inherits its count (Space-Saving), so
/// counts are upper bounds and a heavy newcomer still surfaces.
pub const MAX_TRACKED_CLIENTS: usize = 1_000;

const ALERT_BLOCKED_RATIO: f64 = 0.1;
const ALERT_MIN_REQUESTS: u64 = 100;

#[derive(Debug, Default)]
struct Usage {
    total: u64,
    blocked: u64,
    average_remaining: f64,
    clients: HashMap<String, u64>,
}

impl Usage {
    fn count_client(&mut self, client: &str) {
        if let Some(count) = self.clients.get_mut(client) {
            *count += 1;
            return;
        }
        if self.clients.len() < MAX_TRACKED_CLIENTS {
            self.clients.insert(client.to_string(), 1);
            return;
        }
        let evicted = self
            .clients
            .iter()
            .min_by_key(|(_, count)| **count)
            .map(|(client, count)| (client.clone(), *count));
        if let Some((evicted, floor)) = evicted {
            self.clients.remove(&evicted);
            self.clients.insert(client.to_string(), floor + 1);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientCount {
    pub client: String,
    pub requests: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub class: EndpointClass,
    /// Hours since the Unix epoch.
    pub hour: u64,
    pub total_requests: u64,
    pub blocked_requests: u64,
    pub average_remaining: f64,
    pub top_clients: Vec<ClientCount>,
}

#[derive(Debug, Default)]
pub struct RateLimitMonitor {
    buckets: DashMap<(EndpointClass, u64), Usage>,
}

pub fn hour_of(now_ms: u64) -> u64 {
    now_ms / HOUR_MS
}

impl RateLimitMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        class: EndpointClass,
        client: &str,
        blocked: bool,
        remaining: u64,
        now_ms: u64,
    ) {
        let mut entry = self.buckets.entry((class, hour_of(now_ms))).or_default();
        let usage = entry.value_mut();
        usage.total += 1;
        if blocked {
            usage.blocked += 1;
        }
        let delta = (remaining as f64 - usage.average_remaining) / usage.total as f64;
        usage.average_remaining += delta;

        usage.count_client(client);
    }

    /// Reports for one hour, or for every retained hour when `hour` is `None`.
    /// Sorted by hour, then class name.
    pub fn snapshot(&self, hour: Option<u64>) -> Vec<UsageReport> {
        let mut reports: Vec<UsageReport> = self
            .buckets
            .iter()
            .filter(|entry| hour.map_or(true, |h| entry.key().1 == h))
            .map(|entry| {
                let (class, hour) = *entry.key();
                report(class, hour, entry.value())
            })
            .collect();
        reports.sort_by(|a, b| a.hour.cmp(&b.hour).then(a.class.as_str().cmp(b.class.as_str())));
        reports
    }

    /// More than 10% of this hour's requests rejected, over at least 100
    /// requests.
    pub fn should_alert(&self, class: EndpointClass, now_ms: u64) -> bool {
        self.buckets
            .get(&(class, hour_of(now_ms)))
            .map(|usage| {
                usage.total > ALERT_MIN_REQUESTS
                    && usage.blocked as f64 / usage.total as f64 > ALERT_BLOCKED_RATIO
            })
            .unwrap_or(false)
    }

    /// Current-hour reports for every class over the alert threshold.
    pub fn alerts(&self, now_ms: u64) -> Vec<UsageReport> {
        let hour = hour_of(now_ms);
        EndpointClass::ALL
            .into_iter()
            .filter(|class| self.should_alert(*class, now_ms))
            .filter_map(|class| {
                self.buckets
                    .get(&(class, hour))
                    .map(|usage| report(class, hour, usage.value()))
            })
            .collect()
    }

    /// Drop buckets older than the retention period. Returns how many were
    /// removed.
    pub fn cleanup(&self, now_ms: u64) -> usize {
        let cutoff = hour_of(now_ms).saturating_sub(RETENTION_HOURS);
        let before = self.buckets.len();
        self.buckets.retain(|(_, hour), _| *hour >= cutoff);
        before.saturating_sub(self.buckets.len())
    }
}

fn report(class: EndpointClass, hour: u64, usage: &Usage) -> UsageReport {
    let mut top: Vec<ClientCount> = usage
        .clients
        .iter()
        .map(|(client, requests)| ClientCount {
            client: client.clone(),
            requests: *requests,
        })
        .collect();
    top.sort_by(|a, b| b.requests.cmp(&a.requests).then_with(|| a.client.cmp(&b.client)));
    top.truncate(TOP_CLIENTS);

    UsageReport {
        class,
        hour,
        total_requests: usage.total,
        blocked_requests: usage.blocked,
        average_remaining: usage.average_remaining,
        top_clients: top,
    }
}

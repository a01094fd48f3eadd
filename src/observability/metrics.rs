//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, class,
//!   recorded by the rate limit middleware so rejections are included
//! - `gateway_request_duration_seconds` (histogram): latency by class
//! - `gateway_ratelimit_decisions_total` (counter): by class and outcome
//!   (`allowed`, `rejected`, `degraded`)
//! - `gateway_ratelimit_store_errors_total` (counter): by backend and kind
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op, which is what tests rely on
//! - Prometheus exporter runs its own HTTP listener

use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::limiter::{Decision, EndpointClass};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, class: EndpointClass, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "class" => class.as_str()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "class" => class.as_str())
        .record(start.elapsed().as_secs_f64());
}

pub fn outcome(decision: &Decision) -> &'static str {
    if decision.degraded {
        "degraded"
    } else if decision.allowed {
        "allowed"
    } else {
        "rejected"
    }
}

pub fn record_decision(class: EndpointClass, decision: &Decision) {
    counter!(
        "gateway_ratelimit_decisions_total",
        "class" => class.as_str(),
        "outcome" => outcome(decision)
    )
    .increment(1);
}

pub fn record_store_error(backend: &'static str, kind: &'static str) {
    counter!(
        "gateway_ratelimit_store_errors_total",
        "backend" => backend,
        "kind" => kind
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        let mut d = Decision::degraded(5, 0, 1_000);
        assert_eq!(outcome(&d), "degraded");

        d.degraded = false;
        assert_eq!(outcome(&d), "allowed");

        d.allowed = false;
        assert_eq!(outcome(&d), "rejected");
    }
}

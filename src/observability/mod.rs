//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Limiter and gateway produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → monitor.rs (hourly usage per class, served by the admin API)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//!     → gate-cli usage / alerts
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs via the trace layer
//! - Metrics are cheap (atomic increments)
//! - Usage accounting is in-process; each instance reports its own traffic

pub mod logging;
pub mod metrics;
pub mod monitor;

pub use monitor::RateLimitMonitor;

//! Security subsystem: who is calling, and are they over quota.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (classify, check quota)
//!         → client_id.rs (API key hash, forwarded headers, peer IP)
//!         → headers.rs (RateLimit-*, Retry-After)
//!     → Pass to forwarding
//! ```
//!
//! # Design Decisions
//! - Fail open: a store outage never blocks traffic
//! - No trust in forwarded headers unless configured
//! - Raw API keys are hashed before use

pub mod client_id;
pub mod headers;
pub mod rate_limit;

pub use rate_limit::{rate_limit_middleware, RateLimitState};

//! Routing subsystem: which quota applies to a request.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → classifier.rs (rule lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: EndpointClass (General when nothing matches)
//!
//! Rule Compilation (at startup):
//!     RouteConfig[]
//!     → Sort by priority
//!     → Compile matchers
//!     → Freeze as immutable Classifier
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always yields the same class
//! - First match wins (ordered by priority)

pub mod classifier;
pub mod matcher;

pub use classifier::Classifier;

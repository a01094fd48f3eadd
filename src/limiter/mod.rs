//! Rate limiting core.
//!
//! # Data Flow
//! ```text
//! (client id, endpoint class) → RateLimitKey
//!     → engine.rs    one clock reading → Window
//!     → store        atomic increment of "{prefix}:{class}:{client}:{window_id}"
//!     → window.rs    policy tally (fixed or sliding)
//!     → Decision     allowed / remaining / reset / degraded
//! ```
//!
//! # Design Decisions
//! - One timestamp per check; window id, reset time and sliding weight all
//!   come from it
//! - Rejected requests are counted too
//! - Store failure fails open with `degraded = true`, never retried inline

pub mod clock;
pub mod decision;
pub mod engine;
pub mod key;
pub mod window;

pub use clock::{Clock, MockClock, SystemClock};
pub use decision::Decision;
pub use engine::RateLimiter;
pub use key::{EndpointClass, RateLimitKey, UNKNOWN_CLIENT};
pub use window::{Tally, Window, WindowPolicy};

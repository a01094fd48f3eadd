//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → security::rate_limit (429 or continue)
//!     → admin routes, or forward.rs (relay to upstream)
//!     → response.rs (gateway-generated error bodies)
//!     → Send to client
//! ```

pub mod forward;
pub mod response;
pub mod server;

pub use server::{AppState, GatewayServer};

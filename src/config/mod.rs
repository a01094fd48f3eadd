//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Loaded once at startup; quotas never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, GatewayConfig, LimiterConfig, LimitsConfig, ListenerConfig,
    ObservabilityConfig, RateLimitConfig, RouteConfig, StoreBackend, StoreConfig,
    TimeoutConfig, UpstreamConfig,
};
pub use validation::ValidationError;

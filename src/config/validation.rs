//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, timeouts > 0, addresses parse)
//! - Check route rules are usable and uniquely named
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, StoreBackend};
use crate::limiter::EndpointClass;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("limits.{class}: window_ms must be greater than zero")]
    ZeroWindow { class: EndpointClass },

    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("store.operation_timeout_ms must be greater than zero")]
    ZeroStoreTimeout,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("store.redis_url is required when backend is redis")]
    MissingRedisUrl,

    #[error("routes: duplicate rule name '{0}'")]
    DuplicateRoute(String),

    #[error("routes.{0}: needs a host or a path_prefix")]
    EmptyRoute(String),

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for class in EndpointClass::ALL {
        if config.limits.for_class(class).window_ms == 0 {
            errors.push(ValidationError::ZeroWindow { class });
        }
    }

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if let Some(upstream) = &config.upstream.address {
        check_addr(&mut errors, "upstream.address", upstream);
    }
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.store.operation_timeout_ms == 0 {
        errors.push(ValidationError::ZeroStoreTimeout);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.store.backend == StoreBackend::Redis && config.store.redis_url.trim().is_empty() {
        errors.push(ValidationError::MissingRedisUrl);
    }

    let mut seen = HashSet::new();
    for route in &config.routes {
        if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
        if route.host.is_none() && route.path_prefix.is_none() {
            errors.push(ValidationError::EmptyRoute(route.name.clone()));
        }
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.limits.auth.window_ms = 0;
        config.listener.bind_address = "not-an-address".into();
        config.store.operation_timeout_ms = 0;
        config.admin.enabled = true;
        config.routes.push(RouteConfig::prefix("auth", "/login", EndpointClass::Auth));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroWindow { class: EndpointClass::Auth }));
        assert!(errors.contains(&ValidationError::ZeroStoreTimeout));
        assert!(errors.contains(&ValidationError::MissingAdminKey));
        assert!(errors.contains(&ValidationError::DuplicateRoute("auth".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidAddress { field: "listener.bind_address", .. })));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_route_without_matcher_rejected() {
        let mut config = GatewayConfig::default();
        config.routes = vec![RouteConfig {
            name: "empty".into(),
            host: None,
            path_prefix: None,
            class: EndpointClass::Live,
            priority: 0,
        }];
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::EmptyRoute("empty".into())])
        );
    }

    #[test]
    fn test_redis_backend_needs_url() {
        let mut config = GatewayConfig::default();
        config.store.backend = StoreBackend::Redis;
        config.store.redis_url = " ".into();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::MissingRedisUrl]));
    }
}

//! Endpoint classification.
//!
//! # Responsibilities
//! - Compile route rules from config at startup
//! - Map each request to exactly one [`EndpointClass`]
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - WebSocket upgrades are classified before any rule
//! - Higher priority first; equal priority keeps config order
//! - Unmatched requests fall back to `General`

use axum::http::header::UPGRADE;
use axum::http::request::Parts;

use crate::config::RouteConfig;
use crate::limiter::EndpointClass;
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher};

/// A compiled classification rule.
#[derive(Debug)]
pub struct Rule {
    pub name: String,
    pub class: EndpointClass,
    pub priority: u32,
    matcher: AndMatcher,
}

impl Rule {
    pub fn from_config(config: &RouteConfig) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(host) = &config.host {
            matchers.push(Box::new(HostMatcher::new(host.as_str())));
        }
        if let Some(prefix) = &config.path_prefix {
            matchers.push(Box::new(PathPrefixMatcher::new(prefix.as_str())));
        }
        Self {
            name: config.name.clone(),
            class: config.class,
            priority: config.priority,
            matcher: AndMatcher::new(matchers),
        }
    }
}

#[derive(Debug, Default)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        let mut rules: Vec<Rule> = routes.iter().map(Rule::from_config).collect();
        // Stable sort keeps config order among equal priorities.
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        tracing::debug!(rules = rules.len(), "Compiled endpoint classification rules");
        Self { rules }
    }

    pub fn classify(&self, req: &Parts) -> EndpointClass {
        if is_websocket_upgrade(req) {
            return EndpointClass::WebSocket;
        }
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(req))
            .map(|rule| rule.class)
            .unwrap_or(EndpointClass::General)
    }
}

fn is_websocket_upgrade(req: &Parts) -> bool {
    req.headers
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false)
}

//! Counter identity: who is calling, and which class of endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bucket used when no client identifier can be resolved.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Category of route, used to pick a quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointClass {
    Auth,
    Ai,
    General,
    Live,
    Admin,
    #[serde(rename = "websocket")]
    WebSocket,
}

impl EndpointClass {
    pub const ALL: [EndpointClass; 6] = [
        EndpointClass::Auth,
        EndpointClass::Ai,
        EndpointClass::General,
        EndpointClass::Live,
        EndpointClass::Admin,
        EndpointClass::WebSocket,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Auth => "auth",
            EndpointClass::Ai => "ai",
            EndpointClass::General => "general",
            EndpointClass::Live => "live",
            EndpointClass::Admin => "admin",
            EndpointClass::WebSocket => "websocket",
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partition of the counter space: one client against one endpoint class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    client: String,
    class: EndpointClass,
}

impl RateLimitKey {
    /// An empty or whitespace-only client id collapses into the
    /// [`UNKNOWN_CLIENT`] bucket.
    pub fn new(client: impl Into<String>, class: EndpointClass) -> Self {
        let client = client.into();
        let client = if client.trim().is_empty() {
            UNKNOWN_CLIENT.to_string()
        } else {
            client
        };
        Self { client, class }
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn class(&self) -> EndpointClass {
        self.class
    }

    /// Store key for one window of this partition.
    pub fn storage_key(&self, prefix: &str, window_id: u64) -> String {
        format!("{}:{}:{}:{}", prefix, self.class, self.client, window_id)
    }
}

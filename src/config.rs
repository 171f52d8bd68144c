//! Endpoint configuration: which telemetry server the dashboard talks to.
//!
//! The plant runs two endpoint sets — the on-site server and the remote
//! (VPN-reachable) one — selected by a single boolean switch. All five
//! knobs come from the environment; anything unset falls back to the
//! on-site defaults.

use std::env;

/// One (HTTP base, stream URL) endpoint pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPair {
    /// Base URL of the snapshot store, no trailing slash.
    pub api_base: String,
    /// WebSocket URL of the live stream.
    pub stream: String,
}

/// Resolved endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// `true` selects the local pair, `false` the online pair.
    pub use_local: bool,
    pub local: EndpointPair,
    pub online: EndpointPair,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            use_local: true,
            local: EndpointPair {
                api_base: "http://localhost:8080".to_string(),
                stream: "ws://localhost:8080/stream".to_string(),
            },
            online: EndpointPair {
                api_base: "http://localhost:8080".to_string(),
                stream: "ws://localhost:8080/stream".to_string(),
            },
        }
    }
}

impl EndpointConfig {
    /// Read the configuration from the environment:
    /// `VESSELSCOPE_USE_LOCAL` (`"true"` selects the local pair),
    /// `VESSELSCOPE_LOCAL_API`, `VESSELSCOPE_LOCAL_WS`,
    /// `VESSELSCOPE_ONLINE_API`, `VESSELSCOPE_ONLINE_WS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            use_local: env::var("VESSELSCOPE_USE_LOCAL")
                .map(|v| v == "true")
                .unwrap_or(defaults.use_local),
            local: EndpointPair {
                api_base: env::var("VESSELSCOPE_LOCAL_API").unwrap_or(defaults.local.api_base),
                stream: env::var("VESSELSCOPE_LOCAL_WS").unwrap_or(defaults.local.stream),
            },
            online: EndpointPair {
                api_base: env::var("VESSELSCOPE_ONLINE_API").unwrap_or(defaults.online.api_base),
                stream: env::var("VESSELSCOPE_ONLINE_WS").unwrap_or(defaults.online.stream),
            },
        }
    }

    /// The selected snapshot-store base URL.
    pub fn api_base(&self) -> &str {
        if self.use_local {
            &self.local.api_base
        } else {
            &self.online.api_base
        }
    }

    /// The selected stream URL.
    pub fn stream_url(&self) -> &str {
        if self.use_local {
            &self.local.stream
        } else {
            &self.online.stream
        }
    }
}

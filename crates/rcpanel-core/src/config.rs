//! Centralized configuration for the RC client.

use std::time::Duration;

/// Remote-control endpoint configuration.
pub struct RcConfig;

impl RcConfig {
    /// Where `rclone rcd` listens by default.
    pub const DEFAULT_URL: &'static str = "http://localhost:5572";
    /// Per-call timeout on the HTTP transport.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const USER_AGENT: &'static str = "rcpanel";
    /// Parameter bundle sent for calls that take no arguments.
    pub const EMPTY_PARAMS: &'static str = "{}";
}

/// Job polling configuration.
pub struct JobConfig;

impl JobConfig {
    /// How often a watched job list is refreshed.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
}

/// How the client reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// `rclone rcd` reachable over HTTP.
    Http {
        base_url: String,
        credentials: Option<(String, String)>,
    },
    /// librclone linked into this process.
    Embedded,
}

impl TransportConfig {
    /// HTTP transport config, attaching credentials only when a user is given.
    pub fn http(base_url: impl Into<String>, user: Option<String>, pass: Option<String>) -> Self {
        let credentials = user
            .filter(|u| !u.is_empty())
            .map(|u| (u, pass.unwrap_or_default()));
        TransportConfig::Http {
            base_url: base_url.into(),
            credentials,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Http {
            base_url: RcConfig::DEFAULT_URL.to_string(),
            credentials: None,
        }
    }
}

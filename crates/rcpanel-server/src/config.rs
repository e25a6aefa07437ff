//! Server configuration constants.

use std::time::Duration;

pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_ADDR: &'static str = "127.0.0.1:8080";
    /// Events buffered per update channel before emission waits on the peer.
    pub const UPDATE_CHANNEL_CAPACITY: usize = 32;
    pub const STATS_POLL_INTERVAL: Duration = Duration::from_secs(1);
    /// Region every page reserves for errors no handler claimed.
    pub const DEFAULT_ERROR_REGION: &'static str = "errors";
}

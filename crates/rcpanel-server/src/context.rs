//! Per-request context handed to route handlers.

use crate::error::PanelError;
use crate::updates::UpdateChannel;
use axum::body::Bytes;
use axum::http::header::ACCEPT;
use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Query parameter Datastar uses to carry signals on GET requests.
pub const SIGNALS_QUERY_KEY: &str = "datastar";

/// Request data plus, on streaming routes, the update channel.
#[derive(Debug)]
pub struct Context {
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
    updates: Option<UpdateChannel>,
}

impl Context {
    pub fn new(
        params: HashMap<String, String>,
        query: HashMap<String, String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            params,
            query,
            headers,
            body,
            updates: None,
        }
    }

    pub(crate) fn with_updates(mut self, channel: UpdateChannel) -> Self {
        self.updates = Some(channel);
        self
    }

    /// Named path segment, e.g. `name` in `/api/remotes/{name}`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn require_param(&self, key: &str) -> Result<&str, PanelError> {
        self.param(key)
            .ok_or_else(|| PanelError::bad_request(format!("missing path parameter: {}", key)))
    }

    /// Query string value; empty when absent.
    pub fn query(&self, key: &str) -> &str {
        self.query.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    /// True when the browser asked for an event stream.
    pub fn is_update_request(&self) -> bool {
        self.header(ACCEPT.as_str())
            .is_some_and(|accept| accept.contains("text/event-stream"))
    }

    /// Decode the client's signals: the `datastar` query parameter when
    /// present, the JSON body otherwise.
    pub fn read_signals<T: DeserializeOwned>(&self) -> Result<T, PanelError> {
        let parsed = match self.query.get(SIGNALS_QUERY_KEY) {
            Some(raw) => serde_json::from_str(raw),
            None if self.body.is_empty() => serde_json::from_str("{}"),
            None => serde_json::from_slice(&self.body),
        };
        parsed.map_err(|e| PanelError::bad_request(format!("invalid signals: {}", e)))
    }

    /// The update channel of a streaming route.
    pub fn updates(&self) -> Result<&UpdateChannel, PanelError> {
        self.updates.as_ref().ok_or(PanelError::NoUpdateChannel)
    }
}

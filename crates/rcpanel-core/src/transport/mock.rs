//! Scripted transport for tests.

use super::{RpcReply, Transport};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

type Responder = Box<dyn Fn(&str) -> RpcReply + Send + Sync>;

/// One call observed by a [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: String,
    pub params: String,
}

impl RecordedCall {
    /// Parse the recorded parameters as JSON.
    pub fn params_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.params).unwrap_or(serde_json::Value::Null)
    }
}

/// Transport answering from per-method scripts and recording every call.
///
/// Methods without a script answer status 404 the way `rclone rcd` does for
/// unknown paths. Parameters are recorded exactly as received, before any
/// normalization, so tests can assert on what the client sent.
#[derive(Default)]
pub struct MockTransport {
    responders: Mutex<HashMap<String, Responder>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `method` with a fixed reply.
    pub fn reply(self, method: &str, status: u16, body: &str) -> Self {
        let reply = RpcReply::new(status, body);
        self.respond(method, move |_| reply.clone())
    }

    /// Answer calls to `method` by inspecting the raw params.
    pub fn respond<F>(self, method: &str, responder: F) -> Self
    where
        F: Fn(&str) -> RpcReply + Send + Sync + 'static,
    {
        lock(&self.responders).insert(method.to_string(), Box::new(responder));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Calls made to one method, in order.
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        lock(&self.calls)
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, method: &str, params: &str) -> RpcReply {
        lock(&self.calls).push(RecordedCall {
            method: method.to_string(),
            params: params.to_string(),
        });
        match lock(&self.responders).get(method) {
            Some(responder) => responder(params),
            None => RpcReply::new(
                404,
                serde_json::json!({
                    "error": "couldn't find method",
                    "path": method,
                    "status": 404,
                })
                .to_string(),
            ),
        }
    }
}

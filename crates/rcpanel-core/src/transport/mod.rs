//! Pluggable transports for rclone RC calls.
//!
//! A transport executes one named RC method with a JSON parameter bundle and
//! returns the JSON body plus an HTTP-style status code. Two implementations
//! exist and are chosen at construction time:
//!
//! - [`HttpTransport`]: POSTs to a running `rclone rcd`
//! - [`EmbeddedTransport`]: calls an engine linked into this process
//!
//! Neither variant raises: every failure, including an unreachable engine, is
//! reported through the returned status code. Neither variant retries.

mod embedded;
mod http;
#[cfg(feature = "librclone")]
mod librclone;
#[cfg(any(test, feature = "test-util"))]
mod mock;

pub use embedded::{EmbeddedTransport, Engine};
pub use http::HttpTransport;
#[cfg(feature = "librclone")]
pub use librclone::LibRclone;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockTransport, RecordedCall};

use crate::config::{RcConfig, TransportConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Raw result of one RC call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReply {
    pub body: String,
    pub status: u16,
}

impl RpcReply {
    pub const OK: u16 = 200;
    pub const FAILURE: u16 = 500;

    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            status,
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(Self::OK, body)
    }

    /// A status 500 reply with a synthesized `{"error": message}` body.
    pub fn failure(message: impl std::fmt::Display) -> Self {
        let body = serde_json::json!({ "error": message.to_string() });
        Self::new(Self::FAILURE, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status == Self::OK
    }
}

/// Executes RC calls against an engine.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Call `method` (e.g. `"config/listremotes"`) with a JSON object string.
    ///
    /// An empty `params` is treated as `"{}"`.
    async fn call(&self, method: &str, params: &str) -> RpcReply;

    /// Release engine resources. No calls may follow.
    async fn shutdown(&self) {}
}

/// The RC API always expects a JSON object, even for calls without arguments.
pub fn normalize_params(params: &str) -> &str {
    if params.trim().is_empty() {
        RcConfig::EMPTY_PARAMS
    } else {
        params
    }
}

/// Build the transport described by `config`.
///
/// `Embedded` requires the `librclone` feature; without it the request fails
/// with [`RcError::Config`](crate::RcError::Config).
pub fn from_config(config: &TransportConfig) -> crate::Result<Arc<dyn Transport>> {
    match config {
        TransportConfig::Http {
            base_url,
            credentials,
        } => {
            let mut transport = HttpTransport::new(base_url)?;
            if let Some((user, pass)) = credentials {
                transport = transport.with_auth(user, pass);
            }
            Ok(Arc::new(transport))
        }
        #[cfg(feature = "librclone")]
        TransportConfig::Embedded => Ok(Arc::new(EmbeddedTransport::new(LibRclone))),
        #[cfg(not(feature = "librclone"))]
        TransportConfig::Embedded => {
            Err(crate::RcError::Config(
                "embedded engine requires building with the `librclone` feature".to_string(),
            ))
        }
    }
}

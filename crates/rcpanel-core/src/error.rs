//! Error types for the rclone RC client.
//!
//! Transport-level failures (connection refused, timeout, unreadable body) never
//! reach this module as a separate variant: both transports fold them into a
//! status `500` reply with a synthesized JSON body, so they surface here as
//! [`RcError::Protocol`]. Use [`RcError::is_transport_failure`] to tell them apart.

use thiserror::Error;

/// Main error type for RC operations.
#[derive(Debug, Error)]
pub enum RcError {
    /// The engine (or the transport on its behalf) answered with a non-200 status.
    #[error("rc error {status} calling {method}: {body}")]
    Protocol {
        method: String,
        status: u16,
        /// Raw response body, kept as opaque diagnostic text.
        body: String,
    },

    /// A 200 response whose JSON did not have the expected shape.
    #[error("failed to decode {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("operation was cancelled")]
    Cancelled,

    /// A transport could not be built from its configuration.
    #[error("invalid transport configuration: {0}")]
    Config(String),

    /// The in-process engine failed to start.
    #[error("engine initialization failed: {0}")]
    EngineInit(String),
}

/// Result type alias for RC operations.
pub type Result<T> = std::result::Result<T, RcError>;

impl RcError {
    pub(crate) fn protocol(method: &str, status: u16, body: impl Into<String>) -> Self {
        RcError::Protocol {
            method: method.to_string(),
            status,
            body: body.into(),
        }
    }

    pub(crate) fn decode(method: &str, source: serde_json::Error) -> Self {
        RcError::Decode {
            method: method.to_string(),
            source,
        }
    }

    /// The RPC method that failed, if the error is tied to one.
    pub fn method(&self) -> Option<&str> {
        match self {
            RcError::Protocol { method, .. } | RcError::Decode { method, .. } => Some(method),
            RcError::Cancelled | RcError::Config(_) | RcError::EngineInit(_) => None,
        }
    }

    /// HTTP-style status reported by the transport, for protocol errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            RcError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the failure came from the transport itself rather than the engine.
    ///
    /// Transports report unreachable engines as status 500 with a
    /// `{"error": ...}` body; the engine's own 500s carry extra fields
    /// (`input`, `path`, `status`) that a synthesized body never has.
    pub fn is_transport_failure(&self) -> bool {
        let RcError::Protocol { status, body, .. } = self else {
            return false;
        };
        if *status != 500 {
            return false;
        }
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(map)) => map.len() == 1 && map.contains_key("error"),
            _ => false,
        }
    }
}

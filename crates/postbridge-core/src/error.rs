//! Error types for the postbridge transport.
//!
//! Configuration errors surface synchronously from `Transport::send`; every
//! other variant reaches the caller through the response future.

use crate::protocol::Envelope;
use std::time::Duration;
use thiserror::Error;

/// The wait that a timeout interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    /// Waiting for the readiness sentinel.
    Readiness,
    /// Waiting for the terminal message after the payload was delivered.
    Response,
}

impl std::fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitPhase::Readiness => write!(f, "waiting for readiness"),
            WaitPhase::Response => write!(f, "waiting for response"),
        }
    }
}

/// Main error type for the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    // Configuration errors
    #[error("Unknown endpoint: {name}")]
    UnknownEndpoint { name: String },

    #[error("Invalid endpoint {name}: {message}")]
    InvalidEndpoint { name: String, message: String },

    // Protocol errors
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// The inbound message exactly as received.
        raw: String,
        message: String,
    },

    #[error("Remote error: {}", .0.raw())]
    Remote(Envelope),

    #[error("Timed out {phase} after {after:?}")]
    Timeout { phase: WaitPhase, after: Duration },

    // Channel errors
    #[error("Host error: {message}")]
    Host { message: String },

    #[error("Channel is closed")]
    ChannelClosed,

    #[error("Channel cannot deliver a payload while {state}")]
    NotReady { state: crate::channel::ChannelState },

    #[error("Transport has already sent its request")]
    AlreadySent,

    #[error("Request abandoned before a response arrived")]
    Abandoned,

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl TransportError {
    /// Whether this error comes from endpoint configuration rather than the exchange.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            TransportError::UnknownEndpoint { .. } | TransportError::InvalidEndpoint { .. }
        )
    }

    /// The remote-supplied envelope, for `Remote` errors.
    pub fn remote_envelope(&self) -> Option<&Envelope> {
        match self {
            TransportError::Remote(envelope) => Some(envelope),
            _ => None,
        }
    }
}

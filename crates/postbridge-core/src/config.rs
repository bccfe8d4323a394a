//! Centralized configuration for the postbridge transport.
//!
//! Wire constants shared with the remote handler page, the stock endpoint
//! layout, and the status contract reported to HTTP-client integrations.

use std::time::Duration;

/// Protocol-level configuration.
pub struct TransportConfig;

impl TransportConfig {
    /// Literal the remote context posts once it can accept the payload.
    pub const READY_SENTINEL: &'static str = "ready";
    /// Path of the handler page on an endpoint host.
    pub const HANDLER_PATH: &'static str = "/cors_handler/";
    /// Name of the endpoint registered by `EndpointRegistry::with_handler_host`.
    pub const DEFAULT_ENDPOINT: &'static str = "mmdb";
    /// Request field that carries the endpoint name to the remote side.
    pub const TARGET_FIELD: &'static str = "target";
    /// Envelope field whose truthiness marks a failure response.
    pub const ERROR_FIELD: &'static str = "error";
    /// Name given to the hidden surface, for hosts that support naming.
    pub const SURFACE_NAME: &'static str = "cors_iframe";
}

/// Status contract used by the HTTP bridge.
pub struct HttpConfig;

impl HttpConfig {
    pub const SUCCESS_STATUS: u16 = 200;
    pub const SUCCESS_REASON: &'static str = "success";
    pub const FAILURE_STATUS: u16 = 404;
    pub const FAILURE_REASON: &'static str = "failed";
    /// Key under which the envelope is placed in the outcome body.
    pub const BODY_KEY: &'static str = "json";
}

/// Runtime options for a single transport.
///
/// Both timeouts are off by default: a remote that never loads or never
/// answers leaves the exchange pending until `abort()` is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    /// Maximum wait between opening the channel and the readiness sentinel.
    pub handshake_timeout: Option<Duration>,
    /// Maximum wait between delivering the payload and the terminal message.
    pub response_timeout: Option<Duration>,
}

impl TransportOptions {
    /// Create options with no timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the readiness timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// Set the response timeout.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }
}

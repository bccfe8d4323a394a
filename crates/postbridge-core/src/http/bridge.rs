//! `(status, reason, body)` adapter over a one-shot transport.

use crate::channel::MessageHost;
use crate::config::HttpConfig;
use crate::protocol::Envelope;
use crate::registry::EndpointRegistry;
use crate::{Result, Transport, TransportError};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Completion reported to the HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpOutcome {
    pub status: u16,
    pub reason: &'static str,
    /// `{ "json": <envelope> }`
    pub body: Value,
}

impl HttpOutcome {
    /// Translate a settled response.
    ///
    /// Fulfilled responses become `200 success`; every rejection becomes
    /// `404 failed`. Remote error envelopes are passed through unchanged,
    /// local failures are reported as `{ "error": <message> }`.
    pub fn from_result(result: Result<Envelope>) -> Self {
        match result {
            Ok(envelope) => Self::wrap(
                HttpConfig::SUCCESS_STATUS,
                HttpConfig::SUCCESS_REASON,
                envelope.into_value(),
            ),
            Err(TransportError::Remote(envelope)) => Self::wrap(
                HttpConfig::FAILURE_STATUS,
                HttpConfig::FAILURE_REASON,
                envelope.into_value(),
            ),
            Err(e) => Self::wrap(
                HttpConfig::FAILURE_STATUS,
                HttpConfig::FAILURE_REASON,
                json!({ "error": e.to_string() }),
            ),
        }
    }

    fn wrap(status: u16, reason: &'static str, data: Value) -> Self {
        let mut body = Map::new();
        body.insert(HttpConfig::BODY_KEY.to_string(), data);
        Self {
            status,
            reason,
            body: Value::Object(body),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == HttpConfig::SUCCESS_STATUS
    }

    /// The envelope inside the body.
    pub fn data(&self) -> Option<&Value> {
        self.body.get(HttpConfig::BODY_KEY)
    }
}

/// Transport registration for an HTTP-client layer.
///
/// One bridge serves one request, like the transport it wraps.
#[derive(Debug)]
pub struct HttpBridge {
    transport: Transport,
}

impl HttpBridge {
    pub fn new(registry: Arc<EndpointRegistry>, host: Arc<dyn MessageHost>) -> Self {
        Self::from_transport(Transport::new(registry, host))
    }

    /// Wrap a transport configured elsewhere (for example with timeouts).
    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }

    /// Send through the transport and report the completion as an outcome.
    ///
    /// Configuration errors are returned directly and never become an
    /// outcome.
    pub fn send<P: Serialize + ?Sized>(
        &mut self,
        target: &str,
        params: &P,
    ) -> Result<impl Future<Output = HttpOutcome>> {
        let response = self.transport.send(target, params)?;
        let channel = response.channel_id();

        Ok(async move {
            let outcome = HttpOutcome::from_result(response.await);
            debug!(
                "Channel {} completed with {} {}",
                channel, outcome.status, outcome.reason
            );
            outcome
        })
    }

    pub fn abort(&mut self) {
        self.transport.abort();
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

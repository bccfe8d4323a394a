//! Public `send`/`abort` contract.

use super::exchange::{self, Exchange, SharedExchange};
use super::response::{response_pair, ResponseFuture};
use crate::channel::{Channel, ChannelId, ChannelState, MessageHost};
use crate::config::TransportOptions;
use crate::protocol::Request;
use crate::registry::EndpointRegistry;
use crate::{Result, TransportError};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Builder for [`Transport`].
///
/// # Example
///
/// ```rust,ignore
/// let transport = Transport::builder(registry, host)
///     .handshake_timeout(Duration::from_secs(10))
///     .response_timeout(Duration::from_secs(30))
///     .build();
/// ```
pub struct TransportBuilder {
    registry: Arc<EndpointRegistry>,
    host: Arc<dyn MessageHost>,
    options: TransportOptions,
}

impl TransportBuilder {
    /// Fail the request if the readiness sentinel does not arrive in time.
    ///
    /// Default: no limit
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.options.handshake_timeout = Some(timeout);
        self
    }

    /// Fail the request if the terminal message does not arrive in time
    /// after the payload was delivered.
    ///
    /// Default: no limit
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.options.response_timeout = Some(timeout);
        self
    }

    /// Replace all options at once.
    pub fn options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Transport {
        Transport {
            registry: self.registry,
            host: self.host,
            options: self.options,
            inflight: None,
        }
    }
}

/// A request that has been sent.
struct Inflight {
    exchange: SharedExchange,
    driver: JoinHandle<()>,
    channel: ChannelId,
}

/// One-shot transport: one `send`, at most one response.
///
/// Transports share nothing but the read-only registry, so any number can
/// be in flight at once.
pub struct Transport {
    registry: Arc<EndpointRegistry>,
    host: Arc<dyn MessageHost>,
    options: TransportOptions,
    inflight: Option<Inflight>,
}

impl Transport {
    /// Create a transport with default options (no timeouts).
    pub fn new(registry: Arc<EndpointRegistry>, host: Arc<dyn MessageHost>) -> Self {
        Self::builder(registry, host).build()
    }

    pub fn builder(registry: Arc<EndpointRegistry>, host: Arc<dyn MessageHost>) -> TransportBuilder {
        TransportBuilder {
            registry,
            host,
            options: TransportOptions::default(),
        }
    }

    /// Send `params` to the endpoint registered as `target`.
    ///
    /// Returns as soon as the channel is open; the returned future settles
    /// when the remote answers. Unknown endpoints fail here, before any
    /// channel is created. Must be called from within a Tokio runtime.
    pub fn send<P: Serialize + ?Sized>(&mut self, target: &str, params: &P) -> Result<ResponseFuture> {
        if self.inflight.is_some() {
            return Err(TransportError::AlreadySent);
        }

        let endpoint = self.registry.resolve(target)?;
        let request = Request::new(endpoint, params)?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| TransportError::Host {
            message: format!("no async runtime to drive the exchange: {}", e),
        })?;

        let (channel, inbox) = Channel::open(self.host.clone(), request.address())?;
        let channel_id = channel.id();
        let (slot, future) = response_pair(channel_id);

        let exchange: SharedExchange = Arc::new(Mutex::new(Exchange::new(channel, slot, request)));
        let driver = runtime.spawn(exchange::drive(
            exchange.clone(),
            inbox,
            self.options.clone(),
        ));

        info!("Sent request to {} on channel {}", target, channel_id);

        self.inflight = Some(Inflight {
            exchange,
            driver,
            channel: channel_id,
        });
        Ok(future)
    }

    /// Tear down the channel if it is still open.
    ///
    /// The remote side is not notified and the response future is left
    /// unsettled. Safe to call at any time; a no-op before `send` and after
    /// the exchange has finished.
    pub fn abort(&mut self) {
        let Some(inflight) = &self.inflight else {
            return;
        };

        inflight.driver.abort();
        let closed = exchange::lock(&inflight.exchange).channel.close();
        if closed {
            info!("Aborted request on channel {}", inflight.channel);
        } else {
            debug!("Abort on finished channel {} ignored", inflight.channel);
        }
    }

    /// Current channel state, or `None` before `send`.
    pub fn state(&self) -> Option<ChannelState> {
        self.inflight
            .as_ref()
            .map(|inflight| exchange::channel_state(&inflight.exchange))
    }

    /// Correlation token of the channel, or `None` before `send`.
    pub fn channel_id(&self) -> Option<ChannelId> {
        self.inflight.as_ref().map(|inflight| inflight.channel)
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("options", &self.options)
            .field("channel", &self.channel_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::LoopbackHost;
    use serde_json::json;

    fn registry() -> Arc<EndpointRegistry> {
        Arc::new(EndpointRegistry::with_handler_host("https://mmdb.example.org").unwrap())
    }

    #[tokio::test]
    async fn test_unknown_endpoint_creates_no_channel() {
        let host = Arc::new(LoopbackHost::manual());
        let mut transport = Transport::new(registry(), host.clone());

        let err = transport.send("unknown", &json!({})).unwrap_err();
        assert!(matches!(err, TransportError::UnknownEndpoint { .. }));
        assert_eq!(host.mount_count(), 0);
        assert!(transport.state().is_none());
    }

    #[tokio::test]
    async fn test_second_send_is_rejected() {
        let host = Arc::new(LoopbackHost::manual());
        let mut transport = Transport::new(registry(), host.clone());

        let _future = transport.send("mmdb", &json!({"op": "ping"})).unwrap();
        let err = transport.send("mmdb", &json!({"op": "ping"})).unwrap_err();

        assert!(matches!(err, TransportError::AlreadySent));
        assert_eq!(host.mount_count(), 1);
    }

    #[test]
    fn test_send_outside_runtime_fails_without_mounting() {
        let host = Arc::new(LoopbackHost::manual());
        let mut transport = Transport::new(registry(), host.clone());

        let err = transport.send("mmdb", &json!({"op": "ping"})).unwrap_err();
        assert!(matches!(err, TransportError::Host { .. }));
        assert_eq!(host.mount_count(), 0);
    }

    #[test]
    fn test_abort_before_send_is_noop() {
        let host = Arc::new(LoopbackHost::manual());
        let mut transport = Transport::new(registry(), host);
        transport.abort();
        transport.abort();
        assert!(transport.channel_id().is_none());
    }

    #[test]
    fn test_builder_options() {
        let host = Arc::new(LoopbackHost::manual());
        let transport = Transport::builder(registry(), host)
            .handshake_timeout(Duration::from_secs(1))
            .response_timeout(Duration::from_secs(2))
            .build();

        assert_eq!(transport.options().handshake_timeout, Some(Duration::from_secs(1)));
        assert_eq!(transport.options().response_timeout, Some(Duration::from_secs(2)));
    }
}

//! Channel state and surface lifecycle.

use super::host::{Inbox, MessageHost, MessageSink};
use crate::{Result, TransportError};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Correlation token for one channel. Used for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Channel states, in handshake order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Surface inserted, not yet loaded.
    Created,
    /// Surface loaded, readiness sentinel not yet seen.
    AwaitingReadiness,
    /// Readiness seen, payload being delivered.
    Sending,
    /// Payload delivered, waiting for the terminal message.
    AwaitingResponse,
    /// Surface removed and subscription ended.
    Closed,
}

impl ChannelState {
    /// Whether the readiness sentinel has not been observed yet.
    pub fn is_before_readiness(&self) -> bool {
        matches!(self, ChannelState::Created | ChannelState::AwaitingReadiness)
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Created => write!(f, "created"),
            ChannelState::AwaitingReadiness => write!(f, "awaiting readiness"),
            ChannelState::Sending => write!(f, "sending"),
            ChannelState::AwaitingResponse => write!(f, "awaiting response"),
            ChannelState::Closed => write!(f, "closed"),
        }
    }
}

/// One mounted surface bound to one endpoint address.
///
/// Dropping an open channel closes it.
pub struct Channel {
    id: ChannelId,
    address: Url,
    origin: String,
    state: ChannelState,
    host: Arc<dyn MessageHost>,
    sink: Option<Box<dyn MessageSink>>,
}

impl Channel {
    /// Mount a surface for `address` and install its listener.
    ///
    /// Returns the channel and its inbox. The inbox is the listener; whoever
    /// drives the exchange owns it and drops it when the channel closes.
    pub fn open(host: Arc<dyn MessageHost>, address: &Url) -> Result<(Self, Inbox)> {
        let id = ChannelId::new();
        let surface = host.mount(id, address)?;

        info!("Opened channel {} to {}", id, address);

        let channel = Self {
            id,
            origin: address.origin().ascii_serialization(),
            address: address.clone(),
            state: ChannelState::Created,
            host,
            sink: Some(surface.sink),
        };
        Ok((channel, surface.inbox))
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    /// Origin that inbound messages must come from and posts are pinned to.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ChannelState::Closed
    }

    /// Record that the surface finished loading.
    pub fn mark_loaded(&mut self) {
        if self.state == ChannelState::Created {
            self.transition(ChannelState::AwaitingReadiness);
        }
    }

    /// Record the readiness sentinel. Only valid before readiness.
    pub fn mark_ready(&mut self) -> Result<()> {
        match self.state {
            ChannelState::Created | ChannelState::AwaitingReadiness => {
                self.transition(ChannelState::Sending);
                Ok(())
            }
            ChannelState::Closed => Err(TransportError::ChannelClosed),
            state => Err(TransportError::NotReady { state }),
        }
    }

    /// Post the payload to the surface, pinned to the channel origin.
    ///
    /// Only valid in `Sending`, i.e. after `mark_ready`.
    pub fn post(&mut self, payload: &str) -> Result<()> {
        match self.state {
            ChannelState::Sending => {}
            ChannelState::Closed => return Err(TransportError::ChannelClosed),
            state => return Err(TransportError::NotReady { state }),
        }

        let sink = self.sink.as_ref().ok_or(TransportError::ChannelClosed)?;
        sink.post(payload, &self.origin)?;

        debug!("Channel {} delivered {} byte payload", self.id, payload.len());
        self.transition(ChannelState::AwaitingResponse);
        Ok(())
    }

    /// Remove the surface and end the subscription.
    ///
    /// Returns `true` if this call closed the channel, `false` if it was
    /// already closed.
    pub fn close(&mut self) -> bool {
        if self.state == ChannelState::Closed {
            return false;
        }

        self.sink = None;
        self.host.unmount(self.id);
        self.transition(ChannelState::Closed);
        info!("Closed channel {}", self.id);
        true
    }

    fn transition(&mut self, next: ChannelState) {
        debug!(channel = %self.id, from = %self.state, to = %next, "channel transition");
        self.state = next;
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("address", &self.address.as_str())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::LoopbackHost;

    fn address() -> Url {
        Url::parse("https://mmdb.example.org/cors_handler/").unwrap()
    }

    #[test]
    fn test_open_mounts_surface() {
        let host = Arc::new(LoopbackHost::manual());
        let (channel, _inbox) = Channel::open(host.clone(), &address()).unwrap();

        assert_eq!(channel.state(), ChannelState::Created);
        assert_eq!(channel.origin(), "https://mmdb.example.org");
        assert!(host.is_mounted(channel.id()));
    }

    #[test]
    fn test_post_before_readiness_is_refused() {
        let host = Arc::new(LoopbackHost::manual());
        let (mut channel, _inbox) = Channel::open(host.clone(), &address()).unwrap();

        let err = channel.post("{}").unwrap_err();
        assert!(matches!(
            err,
            TransportError::NotReady {
                state: ChannelState::Created
            }
        ));

        channel.mark_loaded();
        assert!(channel.post("{}").is_err());
        assert!(host.posted(channel.id()).is_empty());
    }

    #[test]
    fn test_handshake_transitions() {
        let host = Arc::new(LoopbackHost::manual());
        let (mut channel, _inbox) = Channel::open(host.clone(), &address()).unwrap();

        channel.mark_loaded();
        assert_eq!(channel.state(), ChannelState::AwaitingReadiness);

        channel.mark_ready().unwrap();
        assert_eq!(channel.state(), ChannelState::Sending);

        channel.post(r#"{"op":"ping"}"#).unwrap();
        assert_eq!(channel.state(), ChannelState::AwaitingResponse);

        let posted = host.posted(channel.id());
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].payload, r#"{"op":"ping"}"#);
        assert_eq!(posted[0].target_origin, "https://mmdb.example.org");

        // A second readiness after delivery is not a valid transition
        assert!(channel.mark_ready().is_err());
    }

    #[test]
    fn test_close_is_idempotent_and_unmounts() {
        let host = Arc::new(LoopbackHost::manual());
        let (mut channel, _inbox) = Channel::open(host.clone(), &address()).unwrap();
        let id = channel.id();

        assert!(channel.close());
        assert!(!channel.close());
        assert!(channel.is_closed());
        assert!(!host.is_mounted(id));
        assert_eq!(host.unmount_count(id), 1);

        assert!(matches!(channel.post("{}"), Err(TransportError::ChannelClosed)));
        assert!(matches!(channel.mark_ready(), Err(TransportError::ChannelClosed)));
    }

    #[test]
    fn test_drop_closes_channel() {
        let host = Arc::new(LoopbackHost::manual());
        let (channel, _inbox) = Channel::open(host.clone(), &address()).unwrap();
        let id = channel.id();

        drop(channel);

        assert!(!host.is_mounted(id));
        assert_eq!(host.unmount_count(id), 1);
    }

    #[test]
    fn test_channel_ids_are_unique() {
        let a = ChannelId::new();
        let b = ChannelId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 32);
    }
}

//! Host environment seam.
//!
//! The transport never touches a document or window directly. A
//! `MessageHost` inserts hidden surfaces, hands back a sink for posting to
//! them, and delivers their inbound traffic on a per-surface inbox. The inbox
//! is the channel's only listener; there is no process-wide subscription.

use super::lifecycle::ChannelId;
use crate::Result;
use tokio::sync::mpsc;
use url::Url;

/// A message posted by a remote context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Serialized origin of the sending context.
    pub origin: String,
    /// Raw string payload.
    pub data: String,
}

impl InboundMessage {
    pub fn new(origin: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: data.into(),
        }
    }
}

/// Events a host delivers to a channel's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The surface finished loading its address.
    Loaded,
    /// The remote context posted a message.
    Message(InboundMessage),
}

/// Receiving half of a surface subscription.
pub type Inbox = mpsc::UnboundedReceiver<HostEvent>;

/// Capability to post a string into a mounted surface.
pub trait MessageSink: Send + Sync {
    /// Post `payload` to the surface. The host must only deliver it if the
    /// surface's current origin equals `target_origin`.
    fn post(&self, payload: &str, target_origin: &str) -> Result<()>;
}

/// A freshly mounted surface: its sink and its subscription.
pub struct Surface {
    pub sink: Box<dyn MessageSink>,
    pub inbox: Inbox,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface").finish_non_exhaustive()
    }
}

/// The embedding environment that owns surfaces and message delivery.
pub trait MessageHost: Send + Sync + 'static {
    /// Insert a hidden surface pointed at `address` and subscribe to it.
    fn mount(&self, id: ChannelId, address: &Url) -> Result<Surface>;

    /// Remove the surface and end its subscription.
    ///
    /// Called once for every successful `mount`.
    fn unmount(&self, id: ChannelId);
}

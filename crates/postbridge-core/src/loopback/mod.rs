//! In-process message host.
//!
//! `LoopbackHost` implements [`MessageHost`] without a browser: mounting a
//! surface records it and opens an inbox, posting records the payload, and
//! unmounting ends the subscription. It runs in one of two modes:
//!
//! - **Manual**: nothing is emitted on its own. Tests push `Loaded` and
//!   messages with `signal_loaded` / `deliver` in whatever order they need.
//! - **Remote**: each mounted surface behaves like a handler page. It
//!   announces readiness right after mounting, passes every accepted post to
//!   a [`RemoteHandler`], and posts the handler's reply back.

pub mod remote;

pub use remote::{EchoRemote, OriginPinned, RemoteHandler, RemoteRequest};

use crate::channel::{ChannelId, HostEvent, InboundMessage, MessageHost, MessageSink, Surface};
use crate::config::TransportConfig;
use crate::{Result, TransportError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

/// Origin the loopback host reports for the local context.
pub const LOOPBACK_ORIGIN: &str = "http://localhost";

/// A payload posted to a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub target_origin: String,
    pub payload: String,
}

struct MountedSurface {
    address: Url,
    origin: String,
    events: mpsc::UnboundedSender<HostEvent>,
}

#[derive(Default)]
struct HostState {
    mounted: HashMap<ChannelId, MountedSurface>,
    posted: HashMap<ChannelId, Vec<PostedMessage>>,
    unmounts: HashMap<ChannelId, usize>,
    mounts: usize,
    last_mounted: Option<ChannelId>,
}

type SharedState = Arc<Mutex<HostState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, HostState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process [`MessageHost`].
pub struct LoopbackHost {
    state: SharedState,
    remote: Option<Arc<dyn RemoteHandler>>,
    local_origin: String,
}

impl LoopbackHost {
    /// Host that only emits what the caller injects.
    pub fn manual() -> Self {
        Self {
            state: SharedState::default(),
            remote: None,
            local_origin: LOOPBACK_ORIGIN.to_string(),
        }
    }

    /// Host whose surfaces are served by `handler`.
    pub fn with_remote<H: RemoteHandler>(handler: H) -> Self {
        Self {
            remote: Some(Arc::new(handler)),
            ..Self::manual()
        }
    }

    /// Set the origin reported to remote handlers as the sender.
    pub fn with_local_origin(mut self, origin: impl Into<String>) -> Self {
        self.local_origin = origin.into();
        self
    }

    /// Emit `Loaded` on a mounted surface. Returns `false` if not mounted.
    pub fn signal_loaded(&self, id: ChannelId) -> bool {
        self.emit(id, |_| HostEvent::Loaded)
    }

    /// Post `data` from the surface's own origin. Returns `false` if the
    /// surface is not mounted, in which case nothing is delivered.
    pub fn deliver(&self, id: ChannelId, data: impl Into<String>) -> bool {
        let data = data.into();
        self.emit(id, move |surface| {
            HostEvent::Message(InboundMessage::new(surface.origin.clone(), data))
        })
    }

    /// Post `data` claiming to come from `origin`.
    pub fn deliver_from(&self, id: ChannelId, origin: impl Into<String>, data: impl Into<String>) -> bool {
        let message = InboundMessage::new(origin, data);
        self.emit(id, move |_| HostEvent::Message(message))
    }

    pub fn is_mounted(&self, id: ChannelId) -> bool {
        lock(&self.state).mounted.contains_key(&id)
    }

    /// Number of surfaces currently mounted.
    pub fn mounted_count(&self) -> usize {
        lock(&self.state).mounted.len()
    }

    /// Number of surfaces ever mounted.
    pub fn mount_count(&self) -> usize {
        lock(&self.state).mounts
    }

    /// Number of times `id` was unmounted.
    pub fn unmount_count(&self, id: ChannelId) -> usize {
        lock(&self.state).unmounts.get(&id).copied().unwrap_or(0)
    }

    pub fn last_mounted(&self) -> Option<ChannelId> {
        lock(&self.state).last_mounted
    }

    /// Address a surface was mounted with, while it is mounted.
    pub fn address_of(&self, id: ChannelId) -> Option<Url> {
        lock(&self.state).mounted.get(&id).map(|s| s.address.clone())
    }

    /// Everything posted to `id`, kept after unmount.
    pub fn posted(&self, id: ChannelId) -> Vec<PostedMessage> {
        lock(&self.state).posted.get(&id).cloned().unwrap_or_default()
    }

    fn emit<F>(&self, id: ChannelId, event: F) -> bool
    where
        F: FnOnce(&MountedSurface) -> HostEvent,
    {
        let state = lock(&self.state);
        match state.mounted.get(&id) {
            Some(surface) => surface.events.send(event(surface)).is_ok(),
            None => {
                debug!("Dropping event for unmounted channel {}", id);
                false
            }
        }
    }
}

impl Default for LoopbackHost {
    fn default() -> Self {
        Self::manual()
    }
}

impl MessageHost for LoopbackHost {
    fn mount(&self, id: ChannelId, address: &Url) -> Result<Surface> {
        let (events, inbox) = mpsc::unbounded_channel();
        let origin = address.origin().ascii_serialization();

        let mut state = lock(&self.state);
        if state.mounted.contains_key(&id) {
            return Err(TransportError::Host {
                message: format!("channel {} is already mounted", id),
            });
        }

        if self.remote.is_some() {
            // A handler page loads and announces itself without prompting.
            let _ = events.send(HostEvent::Loaded);
            let _ = events.send(HostEvent::Message(InboundMessage::new(
                origin.clone(),
                TransportConfig::READY_SENTINEL,
            )));
        }

        debug!(
            "Mounted {} surface for channel {} at {}",
            TransportConfig::SURFACE_NAME,
            id,
            address
        );
        state.mounted.insert(
            id,
            MountedSurface {
                address: address.clone(),
                origin,
                events,
            },
        );
        state.mounts += 1;
        state.last_mounted = Some(id);

        Ok(Surface {
            sink: Box::new(LoopbackSink {
                id,
                state: self.state.clone(),
                remote: self.remote.clone(),
                sender_origin: self.local_origin.clone(),
            }),
            inbox,
        })
    }

    fn unmount(&self, id: ChannelId) {
        let mut state = lock(&self.state);
        if state.mounted.remove(&id).is_none() {
            warn!("Unmount requested for unknown channel {}", id);
        }
        *state.unmounts.entry(id).or_insert(0) += 1;
    }
}

/// Sink handed to a channel by [`LoopbackHost`].
struct LoopbackSink {
    id: ChannelId,
    state: SharedState,
    remote: Option<Arc<dyn RemoteHandler>>,
    sender_origin: String,
}

impl MessageSink for LoopbackSink {
    fn post(&self, payload: &str, target_origin: &str) -> Result<()> {
        let address = {
            let mut state = lock(&self.state);
            let surface = state
                .mounted
                .get(&self.id)
                .ok_or(TransportError::ChannelClosed)?;
            let surface_origin = surface.origin.clone();
            let address = surface.address.clone();

            state.posted.entry(self.id).or_default().push(PostedMessage {
                target_origin: target_origin.to_string(),
                payload: payload.to_string(),
            });

            if target_origin != "*" && target_origin != surface_origin {
                // Same rule a browser applies: wrong target origin, no delivery.
                warn!(
                    "Post to channel {} targets {} but surface is at {}; not delivered",
                    self.id, target_origin, surface_origin
                );
                return Ok(());
            }
            address
        };

        let Some(remote) = self.remote.clone() else {
            return Ok(());
        };

        let request = RemoteRequest {
            sender_origin: self.sender_origin.clone(),
            address,
            payload: payload.to_string(),
        };
        let state = self.state.clone();
        let id = self.id;

        tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Host {
                message: format!("loopback remote needs an async runtime: {}", e),
            })?
            .spawn(async move {
                let origin = request.address.origin().ascii_serialization();
                let Some(reply) = remote.handle(request).await else {
                    debug!("Remote handler for channel {} chose not to reply", id);
                    return;
                };

                let state = lock(&state);
                match state.mounted.get(&id) {
                    Some(surface) => {
                        let _ = surface
                            .events
                            .send(HostEvent::Message(InboundMessage::new(origin, reply)));
                    }
                    None => debug!("Reply for channel {} arrived after unmount", id),
                }
            });

        Ok(())
    }
}

//! Remote side of a loopback surface.

use serde_json::{json, Value};
use tracing::warn;
use url::Url;

/// A payload accepted by a loopback surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    /// Origin of the posting context. Handlers that pin their caller compare
    /// this against the origin they expect.
    pub sender_origin: String,
    /// Address the surface was mounted with.
    pub address: Url,
    /// The raw posted string.
    pub payload: String,
}

impl RemoteRequest {
    /// Parse the payload as JSON.
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.payload)
    }
}

/// Handles requests posted to a loopback surface.
///
/// Returning `None` means the page never answers; the exchange then waits
/// until it times out or is aborted.
#[async_trait::async_trait]
pub trait RemoteHandler: Send + Sync + 'static {
    async fn handle(&self, request: RemoteRequest) -> Option<String>;
}

/// Replies `{"echo": <request>}`, or an error envelope when the request is
/// not JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoRemote;

#[async_trait::async_trait]
impl RemoteHandler for EchoRemote {
    async fn handle(&self, request: RemoteRequest) -> Option<String> {
        let reply = match request.json() {
            Ok(value) => json!({ "echo": value }),
            Err(e) => json!({ "error": format!("invalid request: {}", e) }),
        };
        Some(reply.to_string())
    }
}

/// Handler page that only answers one caller origin.
///
/// Posts from any other origin are dropped without a reply, the way a
/// handler page discards `message` events whose `origin` it does not trust.
#[derive(Debug, Clone)]
pub struct OriginPinned<H> {
    expected_origin: String,
    inner: H,
}

impl<H: RemoteHandler> OriginPinned<H> {
    pub fn new(expected_origin: impl Into<String>, inner: H) -> Self {
        Self {
            expected_origin: expected_origin.into(),
            inner,
        }
    }

    pub fn expected_origin(&self) -> &str {
        &self.expected_origin
    }
}

#[async_trait::async_trait]
impl<H: RemoteHandler> RemoteHandler for OriginPinned<H> {
    async fn handle(&self, request: RemoteRequest) -> Option<String> {
        if request.sender_origin != self.expected_origin {
            warn!(
                "Remote at {} dropped request from {} (expected {})",
                request.address, request.sender_origin, self.expected_origin
            );
            return None;
        }
        self.inner.handle(request).await
    }
}

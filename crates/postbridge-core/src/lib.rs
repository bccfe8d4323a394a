//! Postbridge Core - one-shot cross-context request/response transport.
//!
//! For hosts that cannot make cross-origin HTTP requests, postbridge sends a
//! single payload to a pre-registered endpoint through a hidden surface (a
//! frame pointed at the endpoint's handler page) and receives exactly one
//! JSON envelope back.
//!
//! The exchange is always the same: the surface loads, the remote posts the
//! readiness sentinel, the local side posts the request, the remote posts a
//! terminal envelope. An envelope with a truthy `error` field rejects the
//! response; anything else fulfils it. The channel is torn down right after.
//!
//! # Example
//!
//! ```rust,ignore
//! use postbridge_core::{EndpointRegistry, Transport};
//! use postbridge_core::loopback::{EchoRemote, LoopbackHost};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> postbridge_core::Result<()> {
//!     let registry = Arc::new(EndpointRegistry::with_handler_host("https://mmdb.example.org")?);
//!     let host = Arc::new(LoopbackHost::with_remote(EchoRemote));
//!
//!     let mut transport = Transport::new(registry, host);
//!     let response = transport.send("mmdb", &serde_json::json!({"op": "ping"}))?;
//!
//!     let envelope = response.await?;
//!     println!("{}", envelope.raw());
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod http;
pub mod loopback;
pub mod protocol;
pub mod registry;
pub mod transport;

// Re-export commonly used types
pub use channel::{ChannelId, ChannelState, HostEvent, InboundMessage, MessageHost, MessageSink};
pub use config::{TransportConfig, TransportOptions};
pub use error::{Result, TransportError, WaitPhase};
pub use http::{FallbackPolicy, HostCapabilities, HttpBridge, HttpOutcome, RequestInfo};
pub use protocol::Envelope;
pub use registry::{Endpoint, EndpointRegistry};
pub use transport::{ResponseFuture, Transport, TransportBuilder};

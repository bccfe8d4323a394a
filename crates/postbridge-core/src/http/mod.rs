//! Integration with generic HTTP-client layers.
//!
//! - **Prefilter**: decides whether a request should take the messaging path
//! - **Bridge**: runs a request through a [`Transport`](crate::Transport) and
//!   reports it as `(status, reason, body)`

pub mod bridge;
pub mod prefilter;

pub use bridge::{HttpBridge, HttpOutcome};
pub use prefilter::{FallbackPolicy, HostCapabilities, RequestInfo};

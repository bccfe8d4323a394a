//! Per-request communication channels.
//!
//! A channel is a hidden surface inserted into the host environment and
//! pointed at one endpoint address, plus the subscription that receives that
//! surface's messages. It exists for exactly one exchange.
//!
//! # Architecture
//!
//! - **Host**: the `MessageHost` seam that mounts and unmounts surfaces
//! - **Lifecycle**: `Channel`, which owns one mounted surface and its state
//!
//! Every mounted surface is unmounted exactly once: on the terminal message,
//! on timeout, on `abort()`, or when the channel is dropped.

pub mod host;
pub mod lifecycle;

pub use host::{HostEvent, InboundMessage, Inbox, MessageHost, MessageSink, Surface};
pub use lifecycle::{Channel, ChannelId, ChannelState};

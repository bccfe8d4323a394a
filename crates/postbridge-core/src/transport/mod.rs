//! One-shot transport façade.
//!
//! A `Transport` sends exactly one request. `send` resolves the endpoint,
//! opens a channel and returns a [`ResponseFuture`] right away; a spawned
//! driver task runs the handshake and settles the future when the terminal
//! message arrives. `abort` tears the channel down synchronously.
//!
//! # Architecture
//!
//! - **Facade**: `Transport` and its builder
//! - **Exchange**: the driver that feeds inbox events through the handshake
//! - **Response**: the single-assignment slot and the future observing it

pub mod exchange;
pub mod facade;
pub mod response;

pub use facade::{Transport, TransportBuilder};
pub use response::ResponseFuture;

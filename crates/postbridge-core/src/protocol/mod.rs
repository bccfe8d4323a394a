//! Wire protocol between the local context and a remote handler page.
//!
//! ```text
//! local                          remote
//!   |   (surface loads)            |
//!   | <----------- "ready" ------- |
//!   | ------ request JSON -------> |   pinned to the endpoint origin
//!   | <------ envelope JSON ------ |   {"error": ..} rejects, otherwise fulfils
//! ```
//!
//! - **Envelope**: parsed terminal message, kept verbatim
//! - **Request**: serialized outbound payload
//! - **Router**: classification of inbound strings
//! - **Handshake**: what a classified message means in a given channel state

pub mod envelope;
pub mod handshake;
pub mod request;
pub mod router;

pub use envelope::Envelope;
pub use handshake::{advance, Step};
pub use request::Request;
pub use router::{classify, Inbound};

//! Endpoint registry: the whitelist of destinations a transport may target.
//!
//! Endpoints are loaded once at startup and only read afterwards, so a single
//! registry is shared by every transport behind an `Arc`. Resolving a name that
//! was never registered is an error; there is no default destination.

pub mod endpoint_registry;

pub use endpoint_registry::{Endpoint, EndpointRegistry, EndpointRegistryBuilder};

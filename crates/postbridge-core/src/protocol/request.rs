//! Outbound request payloads.

use crate::config::TransportConfig;
use crate::registry::Endpoint;
use crate::{Result, TransportError};
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// A serialized request bound to one endpoint. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    address: Url,
    payload: String,
}

impl Request {
    /// Serialize `params` for `endpoint`.
    ///
    /// `params` must serialize to a JSON object. The endpoint name is written
    /// to its `target` field so the remote side can route the call.
    pub fn new<P: Serialize + ?Sized>(endpoint: &Endpoint, params: &P) -> Result<Self> {
        let mut fields = match serde_json::to_value(params)? {
            Value::Object(fields) => fields,
            other => {
                return Err(TransportError::Json {
                    message: format!("request parameters must be a JSON object, got {}", other),
                    source: None,
                })
            }
        };

        fields.insert(
            TransportConfig::TARGET_FIELD.to_string(),
            Value::String(endpoint.name().to_string()),
        );

        Ok(Self {
            address: endpoint.address().clone(),
            payload: serde_json::to_string(&fields)?,
        })
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    /// The exact string posted to the remote surface.
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

//! Static name → address mapping for remote handler pages.

use crate::config::TransportConfig;
use crate::{Result, TransportError};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::Url;

/// A registered destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    name: String,
    address: Url,
}

impl Endpoint {
    /// Validate and create an endpoint.
    ///
    /// The address must be an absolute `http` or `https` URL with a host.
    pub fn new(name: impl Into<String>, address: &str) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TransportError::InvalidEndpoint {
                name,
                message: "endpoint name is empty".to_string(),
            });
        }

        let address = Url::parse(address).map_err(|e| TransportError::InvalidEndpoint {
            name: name.clone(),
            message: format!("invalid address {:?}: {}", address, e),
        })?;

        if !matches!(address.scheme(), "http" | "https") || address.host_str().is_none() {
            return Err(TransportError::InvalidEndpoint {
                name,
                message: format!("address must be an absolute http(s) URL, got {}", address),
            });
        }

        Ok(Self { name, address })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    /// Serialized origin of the address, used as the post target.
    pub fn origin(&self) -> String {
        self.address.origin().ascii_serialization()
    }
}

/// Read-only registry of endpoints.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<String, Endpoint>,
}

impl EndpointRegistry {
    /// Start building a registry.
    pub fn builder() -> EndpointRegistryBuilder {
        EndpointRegistryBuilder::default()
    }

    /// Registry with the stock layout: one `mmdb` endpoint whose handler page
    /// lives at `<host>/cors_handler/`.
    pub fn with_handler_host(host: &str) -> Result<Self> {
        let address = format!(
            "{}{}",
            host.trim_end_matches('/'),
            TransportConfig::HANDLER_PATH
        );
        Self::builder()
            .endpoint(TransportConfig::DEFAULT_ENDPOINT, address)
            .build()
    }

    /// Build a registry from `(name, address)` pairs.
    pub fn from_map<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        entries
            .into_iter()
            .fold(Self::builder(), |builder, (name, address)| {
                builder.endpoint(name, address)
            })
            .build()
    }

    /// Build a registry from a JSON object of `{ "name": "address" }`.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: BTreeMap<String, String> = serde_json::from_str(json)?;
        Self::from_map(entries)
    }

    /// Resolve an endpoint name to its registered destination.
    pub fn resolve(&self, name: &str) -> Result<&Endpoint> {
        match self.endpoints.get(name) {
            Some(endpoint) => {
                debug!("Resolved endpoint {} -> {}", name, endpoint.address);
                Ok(endpoint)
            }
            None => {
                warn!("Refusing request to unregistered endpoint {:?}", name);
                Err(TransportError::UnknownEndpoint {
                    name: name.to_string(),
                })
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Builder for [`EndpointRegistry`]. Validation happens in `build()`.
#[derive(Debug, Default)]
pub struct EndpointRegistryBuilder {
    entries: Vec<(String, String)>,
}

impl EndpointRegistryBuilder {
    /// Register an endpoint.
    pub fn endpoint(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.entries.push((name.into(), address.into()));
        self
    }

    /// Validate every entry and build the registry.
    ///
    /// Fails on the first invalid address or duplicate name.
    pub fn build(self) -> Result<EndpointRegistry> {
        let mut endpoints = BTreeMap::new();

        for (name, address) in self.entries {
            let endpoint = Endpoint::new(name, &address)?;
            if endpoints.contains_key(endpoint.name()) {
                return Err(TransportError::InvalidEndpoint {
                    name: endpoint.name,
                    message: "duplicate endpoint name".to_string(),
                });
            }
            endpoints.insert(endpoint.name.clone(), endpoint);
        }

        Ok(EndpointRegistry { endpoints })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_returns_configured_address() {
        let registry = EndpointRegistry::builder()
            .endpoint("mmdb", "https://mmdb.example.org/cors_handler/")
            .endpoint("search", "https://search.example.org/bridge")
            .build()
            .unwrap();

        assert_eq!(
            registry.resolve("mmdb").unwrap().address().as_str(),
            "https://mmdb.example.org/cors_handler/"
        );
        assert_eq!(
            registry.resolve("search").unwrap().address().as_str(),
            "https://search.example.org/bridge"
        );
    }

    #[test]
    fn test_resolve_unknown_name_fails() {
        let registry = EndpointRegistry::with_handler_host("https://mmdb.example.org").unwrap();

        for name in ["unknown", "", "MMDB", "mmdb "] {
            match registry.resolve(name) {
                Err(TransportError::UnknownEndpoint { name: missing }) => assert_eq!(missing, name),
                other => panic!("Expected UnknownEndpoint for {:?}, got: {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_with_handler_host_appends_handler_path() {
        let registry = EndpointRegistry::with_handler_host("https://mmdb.example.org/").unwrap();
        let endpoint = registry.resolve(TransportConfig::DEFAULT_ENDPOINT).unwrap();

        assert_eq!(
            endpoint.address().as_str(),
            "https://mmdb.example.org/cors_handler/"
        );
        assert_eq!(endpoint.origin(), "https://mmdb.example.org");
    }

    #[test]
    fn test_from_json() {
        let registry = EndpointRegistry::from_json(
            r#"{"mmdb": "https://mmdb.example.org/cors_handler/", "stats": "http://localhost:8080/h"}"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["mmdb", "stats"]);
        assert_eq!(registry.resolve("stats").unwrap().origin(), "http://localhost:8080");
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let result = EndpointRegistry::from_json(r#"["https://mmdb.example.org"]"#);
        assert!(matches!(result, Err(TransportError::Json { .. })));
    }

    #[test]
    fn test_rejects_relative_and_non_http_addresses() {
        for address in ["/cors_handler/", "ftp://files.example.org/", "javascript:alert(1)"] {
            let result = EndpointRegistry::builder().endpoint("x", address).build();
            assert!(
                matches!(result, Err(TransportError::InvalidEndpoint { .. })),
                "address {:?} should be rejected",
                address
            );
        }
    }

    #[test]
    fn test_rejects_duplicate_and_empty_names() {
        let duplicate = EndpointRegistry::builder()
            .endpoint("mmdb", "https://a.example.org/")
            .endpoint("mmdb", "https://b.example.org/")
            .build();
        assert!(matches!(duplicate, Err(TransportError::InvalidEndpoint { .. })));

        let empty = EndpointRegistry::builder()
            .endpoint("  ", "https://a.example.org/")
            .build();
        assert!(matches!(empty, Err(TransportError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_empty_registry() {
        let registry = EndpointRegistry::default();
        assert!(registry.is_empty());
        assert!(!registry.contains("mmdb"));
        assert!(registry.resolve("mmdb").is_err());
    }
}

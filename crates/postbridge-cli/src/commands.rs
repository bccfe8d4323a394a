//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use postbridge_core::loopback::{EchoRemote, LoopbackHost, OriginPinned, LOOPBACK_ORIGIN};
use postbridge_core::{EndpointRegistry, Transport, TransportError};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_HANDLER_HOST: &str = "http://localhost:8000";

/// Load the registry from a JSON file, or build the stock one for
/// `handler_host`.
pub fn load_registry(config: Option<&Path>, handler_host: &str) -> Result<Arc<EndpointRegistry>> {
    let registry = match config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            EndpointRegistry::from_json(&json)
                .with_context(|| format!("Invalid endpoint registry in {}", path.display()))?
        }
        None => EndpointRegistry::with_handler_host(handler_host)
            .with_context(|| format!("Invalid handler host {}", handler_host))?,
    };
    Ok(Arc::new(registry))
}

pub fn list_endpoints(registry: &EndpointRegistry) -> String {
    registry
        .iter()
        .map(|endpoint| format!("{}\t{}", endpoint.name(), endpoint.address()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn resolve(registry: &EndpointRegistry, name: &str) -> Result<String> {
    let endpoint = registry.resolve(name)?;
    Ok(format!(
        "{} -> {} (origin {})",
        endpoint.name(),
        endpoint.address(),
        endpoint.origin()
    ))
}

/// Send `params` to `name` through a loopback surface served by
/// [`EchoRemote`], pinned to the loopback origin, and return the raw reply
/// envelope.
pub async fn ping(
    registry: Arc<EndpointRegistry>,
    name: &str,
    params: &str,
    timeout_ms: u64,
) -> Result<String> {
    let params: Value = serde_json::from_str(params).context("--params is not valid JSON")?;

    let remote = OriginPinned::new(LOOPBACK_ORIGIN, EchoRemote);
    let mut builder = Transport::builder(registry, Arc::new(LoopbackHost::with_remote(remote)));
    if timeout_ms > 0 {
        let timeout = Duration::from_millis(timeout_ms);
        builder = builder.handshake_timeout(timeout).response_timeout(timeout);
    }
    let mut transport = builder.build();

    let response = transport.send(name, &params)?;
    info!("Sent request to {} on channel {}", name, response.channel_id());

    match response.await {
        Ok(envelope) => Ok(envelope.raw().to_string()),
        Err(TransportError::Remote(envelope)) => {
            bail!("Endpoint {} answered with an error: {}", name, envelope.raw())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_registry_from_handler_host() {
        let registry = load_registry(None, "https://mmdb.example.org/").unwrap();
        assert_eq!(
            resolve(&registry, "mmdb").unwrap(),
            "mmdb -> https://mmdb.example.org/cors_handler/ (origin https://mmdb.example.org)"
        );
    }

    #[test]
    fn test_load_registry_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"mmdb": "https://a.example.org/cors_handler/", "geo": "https://b.example.org/h/"}}"#
        )
        .unwrap();

        let registry = load_registry(Some(file.path()), DEFAULT_HANDLER_HOST).unwrap();
        assert_eq!(
            list_endpoints(&registry),
            "geo\thttps://b.example.org/h/\nmmdb\thttps://a.example.org/cors_handler/"
        );
    }

    #[test]
    fn test_load_registry_rejects_bad_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"mmdb": "not a url"}}"#).unwrap();
        assert!(load_registry(Some(file.path()), DEFAULT_HANDLER_HOST).is_err());

        let missing = Path::new("/nonexistent/postbridge.json");
        assert!(load_registry(Some(missing), DEFAULT_HANDLER_HOST).is_err());
    }

    #[test]
    fn test_resolve_unknown_endpoint() {
        let registry = load_registry(None, DEFAULT_HANDLER_HOST).unwrap();
        assert!(resolve(&registry, "unknown").is_err());
    }

    #[tokio::test]
    async fn test_ping_echoes_request() {
        let registry = load_registry(None, DEFAULT_HANDLER_HOST).unwrap();
        let reply = ping(registry, "mmdb", r#"{"op":"ping"}"#, 1000).await.unwrap();

        let reply: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(reply, serde_json::json!({"echo": {"op": "ping", "target": "mmdb"}}));
    }

    #[tokio::test]
    async fn test_ping_rejects_bad_params() {
        let registry = load_registry(None, DEFAULT_HANDLER_HOST).unwrap();
        assert!(ping(registry.clone(), "mmdb", "not json", 0).await.is_err());
        assert!(ping(registry, "nope", "{}", 0).await.is_err());
    }
}

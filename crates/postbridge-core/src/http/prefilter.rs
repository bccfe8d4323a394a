//! Routing decision for the messaging fallback.

use url::Url;

/// What the HTTP layer knows about an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub url: Url,
    /// Serialized origin of the page issuing the request.
    pub page_origin: String,
}

impl RequestInfo {
    pub fn new(url: Url, page_origin: impl Into<String>) -> Self {
        Self {
            url,
            page_origin: page_origin.into(),
        }
    }

    pub fn is_cross_origin(&self) -> bool {
        self.url.origin().ascii_serialization() != self.page_origin
    }
}

/// Features of the host environment relevant to routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// The host can make cross-origin HTTP requests natively.
    pub native_cross_origin: bool,
    /// The host can mount surfaces and exchange messages with them.
    pub cross_context_messaging: bool,
}

impl HostCapabilities {
    /// A host with standard cross-origin support.
    pub fn modern() -> Self {
        Self {
            native_cross_origin: true,
            cross_context_messaging: true,
        }
    }

    /// A host that can only reach other origins through messaging.
    pub fn legacy() -> Self {
        Self {
            native_cross_origin: false,
            cross_context_messaging: true,
        }
    }
}

/// Decides when a request goes through the messaging transport.
pub struct FallbackPolicy;

impl FallbackPolicy {
    /// Route through the transport only for cross-origin requests the host
    /// cannot make natively, and only if messaging is available.
    pub fn should_route(request: &RequestInfo, host: &HostCapabilities) -> bool {
        request.is_cross_origin() && !host.native_cross_origin && host.cross_context_messaging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> RequestInfo {
        RequestInfo::new(Url::parse(url).unwrap(), "https://app.example.org")
    }

    #[test]
    fn test_cross_origin_detection() {
        assert!(!request("https://app.example.org/api").is_cross_origin());
        assert!(request("https://mmdb.example.org/api").is_cross_origin());
        assert!(request("http://app.example.org/api").is_cross_origin());
        assert!(request("https://app.example.org:8443/api").is_cross_origin());
    }

    #[test]
    fn test_routing_truth_table() {
        let cross = request("https://mmdb.example.org/api");
        let same = request("https://app.example.org/api");
        let no_messaging = HostCapabilities {
            native_cross_origin: false,
            cross_context_messaging: false,
        };

        assert!(FallbackPolicy::should_route(&cross, &HostCapabilities::legacy()));
        assert!(!FallbackPolicy::should_route(&cross, &HostCapabilities::modern()));
        assert!(!FallbackPolicy::should_route(&cross, &no_messaging));
        assert!(!FallbackPolicy::should_route(&same, &HostCapabilities::legacy()));
        assert!(!FallbackPolicy::should_route(&same, &HostCapabilities::modern()));
    }
}

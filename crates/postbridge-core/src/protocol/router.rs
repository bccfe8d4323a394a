//! Classification of inbound messages.

use super::envelope::Envelope;
use crate::config::TransportConfig;
use crate::TransportError;

/// An inbound message after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The readiness sentinel.
    Ready,
    /// Terminal message without a truthy `error` field.
    Success(Envelope),
    /// Terminal message with a truthy `error` field.
    Failure(Envelope),
    /// Terminal message that is not a JSON object.
    Malformed { raw: String, message: String },
}

impl Inbound {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Inbound::Ready)
    }
}

/// Classify a raw inbound string.
pub fn classify(data: &str) -> Inbound {
    if data == TransportConfig::READY_SENTINEL {
        return Inbound::Ready;
    }

    match Envelope::parse(data) {
        Ok(envelope) if envelope.is_error() => Inbound::Failure(envelope),
        Ok(envelope) => Inbound::Success(envelope),
        Err(TransportError::MalformedResponse { raw, message }) => {
            Inbound::Malformed { raw, message }
        }
        Err(other) => Inbound::Malformed {
            raw: data.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_sentinel_is_exact() {
        assert_eq!(classify("ready"), Inbound::Ready);
        assert!(classify("Ready").is_terminal());
        assert!(classify(" ready").is_terminal());
        // JSON string "ready" is a terminal (malformed) message, not readiness
        assert!(matches!(classify("\"ready\""), Inbound::Malformed { .. }));
    }

    #[test]
    fn test_success_and_failure() {
        match classify(r#"{"pong":true}"#) {
            Inbound::Success(envelope) => assert_eq!(envelope.raw(), r#"{"pong":true}"#),
            other => panic!("Expected Success, got: {:?}", other),
        }

        match classify(r#"{"error":"unauthorized","detail":"token"}"#) {
            Inbound::Failure(envelope) => {
                assert_eq!(envelope.raw(), r#"{"error":"unauthorized","detail":"token"}"#)
            }
            other => panic!("Expected Failure, got: {:?}", other),
        }

        assert!(matches!(classify(r#"{"error":null}"#), Inbound::Success(_)));
    }

    #[test]
    fn test_malformed() {
        match classify("{not valid json") {
            Inbound::Malformed { raw, message } => {
                assert_eq!(raw, "{not valid json");
                assert!(message.contains("invalid JSON"));
            }
            other => panic!("Expected Malformed, got: {:?}", other),
        }
        assert!(matches!(classify(""), Inbound::Malformed { .. }));
    }
}

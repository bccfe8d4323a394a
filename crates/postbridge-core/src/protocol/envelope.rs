//! Terminal message envelopes.

use crate::config::TransportConfig;
use crate::{Result, TransportError};
use serde_json::{Map, Value};

/// A terminal message parsed as a JSON object.
///
/// The raw string is kept so callers receive the payload exactly as the
/// remote sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    raw: String,
    body: Map<String, Value>,
}

impl Envelope {
    /// Parse a terminal message. Anything other than a JSON object is malformed.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| TransportError::MalformedResponse {
                raw: raw.to_string(),
                message: format!("invalid JSON: {}", e),
            })?;

        match value {
            Value::Object(body) => Ok(Self {
                raw: raw.to_string(),
                body,
            }),
            other => Err(TransportError::MalformedResponse {
                raw: raw.to_string(),
                message: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }

    /// The message exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// The `error` field, if present.
    pub fn error(&self) -> Option<&Value> {
        self.body.get(TransportConfig::ERROR_FIELD)
    }

    /// Whether the envelope marks a failure (truthy `error` field).
    pub fn is_error(&self) -> bool {
        self.error().is_some_and(is_truthy)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.body.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}

/// Truthiness as the handler page's scripting environment judges it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_keeps_raw_text() {
        let raw = r#"{ "pong" : true,  "n": 1.50 }"#;
        let envelope = Envelope::parse(raw).unwrap();

        assert_eq!(envelope.raw(), raw);
        assert_eq!(envelope.get("pong"), Some(&json!(true)));
        assert!(!envelope.is_error());
    }

    #[test]
    fn test_error_truthiness() {
        let cases = [
            (r#"{"error":"unauthorized"}"#, true),
            (r#"{"error":{"code":403}}"#, true),
            (r#"{"error":[]}"#, true),
            (r#"{"error":1}"#, true),
            (r#"{"error":true}"#, true),
            (r#"{"error":""}"#, false),
            (r#"{"error":0}"#, false),
            (r#"{"error":false}"#, false),
            (r#"{"error":null}"#, false),
            (r#"{"data":"x"}"#, false),
        ];

        for (raw, expected) in cases {
            let envelope = Envelope::parse(raw).unwrap();
            assert_eq!(envelope.is_error(), expected, "case {}", raw);
        }
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        match Envelope::parse("{not valid json") {
            Err(TransportError::MalformedResponse { raw, .. }) => {
                assert_eq!(raw, "{not valid json")
            }
            other => panic!("Expected MalformedResponse, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        for raw in ["42", "\"pong\"", "[1,2]", "null", "true"] {
            assert!(
                matches!(
                    Envelope::parse(raw),
                    Err(TransportError::MalformedResponse { .. })
                ),
                "case {}",
                raw
            );
        }
    }
}

//! Response payloads declared by a mock definition.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The payload sent to the client.
///
/// Objects and arrays are [`Structured`](ResponseValue::Structured) and are
/// encoded as JSON. Strings, numbers, booleans and `null` are
/// [`Scalar`](ResponseValue::Scalar) and are written out as plain text.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    Scalar(String),
    Structured(Value),
}

impl ResponseValue {
    pub fn is_structured(&self) -> bool {
        matches!(self, ResponseValue::Structured(_))
    }

    /// Encode to the bytes written as the response body.
    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        match self {
            ResponseValue::Scalar(text) => Ok(Bytes::from(text.clone())),
            ResponseValue::Structured(value) => serde_json::to_vec(value).map(Bytes::from),
        }
    }

    /// Decode a response body.
    ///
    /// A body holding a JSON object or array decodes to a structured value;
    /// anything else is kept as text.
    pub fn decode(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => ResponseValue::Structured(value),
            _ => ResponseValue::Scalar(String::from_utf8_lossy(body).into_owned()),
        }
    }
}

impl From<Value> for ResponseValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(_) | Value::Array(_) => ResponseValue::Structured(value),
            Value::String(text) => ResponseValue::Scalar(text),
            Value::Null => ResponseValue::Scalar(String::new()),
            other => ResponseValue::Scalar(other.to_string()),
        }
    }
}

impl Serialize for ResponseValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseValue::Scalar(text) => serializer.serialize_str(text),
            ResponseValue::Structured(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ResponseValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ResponseValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_shapes() {
        assert!(ResponseValue::from(json!({"a": 1})).is_structured());
        assert!(ResponseValue::from(json!([1, 2])).is_structured());
        assert_eq!(
            ResponseValue::from(json!("text")),
            ResponseValue::Scalar("text".to_string())
        );
        assert_eq!(
            ResponseValue::from(json!(42)),
            ResponseValue::Scalar("42".to_string())
        );
        assert_eq!(
            ResponseValue::from(json!(true)),
            ResponseValue::Scalar("true".to_string())
        );
        assert_eq!(
            ResponseValue::from(Value::Null),
            ResponseValue::Scalar(String::new())
        );
    }

    #[test]
    fn test_structured_round_trip() {
        let original = ResponseValue::from(json!({
            "z": [1, 2.5, "three", null],
            "a": {"nested": {"ok": true}}
        }));
        let encoded = original.encode().unwrap();
        assert_eq!(ResponseValue::decode(&encoded), original);
    }

    #[test]
    fn test_structured_encoding_keeps_key_order() {
        let value = ResponseValue::from(json!({"z": 1, "a": 2}));
        assert_eq!(value.encode().unwrap(), Bytes::from_static(br#"{"z":1,"a":2}"#));
    }

    #[test]
    fn test_scalar_encodes_verbatim() {
        let value = ResponseValue::Scalar("<xml>hi</xml>".to_string());
        assert_eq!(value.encode().unwrap(), Bytes::from_static(b"<xml>hi</xml>"));
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(
            ResponseValue::decode(b"plain text"),
            ResponseValue::Scalar("plain text".to_string())
        );
        assert_eq!(
            ResponseValue::decode(b"\"quoted\""),
            ResponseValue::Scalar("\"quoted\"".to_string())
        );
    }
}

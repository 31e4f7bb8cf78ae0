//! Field value serialization.

use thiserror::Error;

/// A session field value.
///
/// One of string, number, boolean, null, sequence or mapping.
pub type Value = serde_json::Value;

/// Codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to encode value: {0}")]
    Encode(String),
    #[error("Failed to decode value: {0}")]
    Decode(String),
}

/// Serializer/deserializer pair applied to every stored field.
pub trait Codec: Send + Sync {
    /// Encode a value into its stored textual form.
    ///
    /// # Errors
    /// Returns error if the value cannot be represented.
    fn encode(&self, value: &Value) -> Result<String, CodecError>;

    /// Decode a stored payload back into a value.
    ///
    /// # Errors
    /// Returns error if the payload is malformed.
    fn decode(&self, raw: &str) -> Result<Value, CodecError>;
}

/// JSON codec, the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        serde_json::from_str(raw).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_encodes_compact_text() {
        let raw = JsonCodec.encode(&json!({"bar": "woot"})).unwrap();
        assert_eq!(raw, r#"{"bar":"woot"}"#);
        assert_eq!(JsonCodec.encode(&Value::Null).unwrap(), "null");
    }

    #[test]
    fn test_json_decodes_nested_values() {
        let value = JsonCodec.decode(r#"[1, true, null, {"a": [2.5]}]"#).unwrap();
        assert_eq!(value, json!([1, true, null, {"a": [2.5]}]));
    }

    #[test]
    fn test_json_rejects_malformed_payload() {
        let err = JsonCodec.decode("{not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}

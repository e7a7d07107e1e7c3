//! Table encoding
//!
//! A table is persisted as a single JSON array of row objects.

use serde_json::{Map, Value};

/// A single row: an open mapping from field name to value
pub type Row = Map<String, Value>;

/// Encodes and decodes a whole row collection.
///
/// Implementations must round-trip nested arrays, nested objects and nulls
/// losslessly.
pub trait TableCodec: Send + Sync {
    /// Encode the row collection to bytes
    fn encode(&self, rows: &[Row]) -> Result<Vec<u8>, String>;

    /// Decode bytes into a row collection
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Row>, String>;
}

/// JSON array codec
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Pretty-printed output (2-space indent)
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Single-line output
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::pretty()
    }
}

impl TableCodec for JsonCodec {
    fn encode(&self, rows: &[Row]) -> Result<Vec<u8>, String> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(rows)
        } else {
            serde_json::to_vec(rows)
        };
        encoded.map_err(|e| format!("failed to encode rows: {}", e))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Row>, String> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid JSON: {}", e))?;

        let items = match value {
            Value::Array(items) => items,
            other => return Err(format!("expected array of rows, found {}", type_name(&other))),
        };

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(row) => Ok(row),
                other => Err(format!("row {} is {}, expected object", i, type_name(&other))),
            })
            .collect()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_nested_values_survive() {
        let codec = JsonCodec::pretty();
        let rows = vec![row(json!({
            "id": "a",
            "key_takeaways": ["one", "two"],
            "meta": {"nested": {"deep": null}},
            "score": 4.5,
            "thumbnail_url": null
        }))];

        let bytes = codec.encode(&rows).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), rows);
    }

    #[test]
    fn test_pretty_uses_two_space_indent() {
        let bytes = JsonCodec::pretty().encode(&[row(json!({"id": "a"}))]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n    \"id\": \"a\""));

        let bytes = JsonCodec::compact().encode(&[row(json!({"id": "a"}))]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"[{"id":"a"}]"#);
    }

    #[test]
    fn test_decode_rejects_non_array() {
        let err = JsonCodec::default().decode(br#"{"id": "a"}"#).unwrap_err();
        assert!(err.contains("expected array"));
    }

    #[test]
    fn test_decode_rejects_non_object_row() {
        let err = JsonCodec::default().decode(br#"[{"id": "a"}, 3]"#).unwrap_err();
        assert!(err.contains("row 1"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(JsonCodec::default().decode(b"[{\"id\": ").is_err());
    }
}

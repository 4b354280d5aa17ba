//! C8 — Document Codec (structured JSON, flat or nested). See `spec.md`
//! §4.8.

use serde_json::Value;

use crate::codec::{CodecError, RecordCodec};
use crate::domain::tree;
use crate::models::{Record, FIELD_CHILDREN};

pub struct DocumentCodec;

impl RecordCodec for DocumentCodec {
    /// Emits `records` as-is (the caller is responsible for having already
    /// called `tree::nest` beforehand if a nested shape is desired;
    /// `_references` survives either shape unchanged).
    fn encode(&self, records: &[Record]) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(records).map_err(|e| CodecError::Other(e.to_string()))
    }

    /// Accepts either a flat array or a nested forest; normalizes to flat by
    /// calling `tree::flatten` whenever any top-level record carries a
    /// `children` field.
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Record>, CodecError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed {
            line: e.line(),
            message: e.to_string(),
        })?;

        let Value::Array(items) = value else {
            return Err(CodecError::Other("document body must be a JSON array".to_string()));
        };

        let mut records = Vec::with_capacity(items.len());
        let mut any_nested = false;
        for item in items {
            let Value::Object(record) = item else {
                return Err(CodecError::Other("every element must be a JSON object".to_string()));
            };
            if record.contains_key(FIELD_CHILDREN) {
                any_nested = true;
            }
            records.push(record);
        }

        if any_nested {
            Ok(tree::flatten(records))
        } else {
            Ok(records)
        }
    }

    fn media_type(&self) -> &'static str {
        "application/json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_round_trips_unchanged() {
        let mut r = Record::new();
        r.insert("id".to_string(), json!("u1"));
        let codec = DocumentCodec;
        let bytes = codec.encode(&[r]).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded[0]["id"], json!("u1"));
    }

    #[test]
    fn nested_document_is_flattened_on_decode() {
        let body = json!([
            {"_original_id": "c1", "name": "Backend", "children": [
                {"_original_id": "c2", "name": "API", "children": []}
            ]}
        ]);
        let codec = DocumentCodec;
        let decoded = codec.decode(serde_json::to_vec(&body).unwrap().as_slice()).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1]["parent_id"], json!("c1"));
    }

    #[test]
    fn preserves_references_sidecar() {
        let body = json!([
            {"id": "t1", "_references": {"assigned_to_id": {"resource_type": "users"}}}
        ]);
        let codec = DocumentCodec;
        let decoded = codec.decode(serde_json::to_vec(&body).unwrap().as_slice()).unwrap();
        assert_eq!(decoded[0]["_references"]["assigned_to_id"]["resource_type"], json!("users"));
    }
}

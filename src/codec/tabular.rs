//! C7 — Tabular Codec (flat, columnar CSV). See `spec.md` §4.7.

use std::collections::HashSet;

use serde_json::Value;

use crate::codec::{CodecError, RecordCodec};
use crate::models::{Record, FIELD_CHILDREN};

pub struct TabularCodec;

impl RecordCodec for TabularCodec {
    fn encode(&self, records: &[Record]) -> Result<Vec<u8>, CodecError> {
        let header = column_union(records);

        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer
            .write_record(&header)
            .map_err(|e| CodecError::Other(e.to_string()))?;

        for record in records {
            let row: Vec<String> = header.iter().map(|field| cell_for(record.get(field.as_str()))).collect();
            writer
                .write_record(&row)
                .map_err(|e| CodecError::Other(e.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| CodecError::Other(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Record>, CodecError> {
        let mut reader = csv::ReaderBuilder::new().from_reader(bytes);
        let headers = reader
            .headers()
            .map_err(|e| CodecError::Other(e.to_string()))?
            .clone();

        let mut out = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let row = result.map_err(|e| CodecError::Malformed {
                line: line + 2,
                message: e.to_string(),
            })?;

            let mut record = Record::new();
            for (field, cell) in headers.iter().zip(row.iter()) {
                record.insert(field.to_string(), parse_cell(cell));
            }
            out.push(record);
        }

        Ok(out)
    }

    fn media_type(&self) -> &'static str {
        "text/csv"
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}

/// Union of field names across all records, ordered by first appearance.
/// `children` is never part of the tabular shape.
fn column_union(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut header = Vec::new();

    for record in records {
        for field in record.keys() {
            if field == FIELD_CHILDREN {
                continue;
            }
            if seen.insert(field.clone()) {
                header.push(field.clone());
            }
        }
    }

    header
}

fn cell_for(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested @ (Value::Array(_) | Value::Object(_))) => {
            serde_json::to_string(nested).unwrap_or_default()
        }
    }
}

fn parse_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(cell).unwrap_or_else(|_| Value::String(cell.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_flat_records_without_fks() {
        let mut u1 = Record::new();
        u1.insert("id".to_string(), json!("u1"));
        u1.insert("email".to_string(), json!("a@x"));
        let mut u2 = Record::new();
        u2.insert("id".to_string(), json!("u2"));
        u2.insert("email".to_string(), json!("b@x"));

        let codec = TabularCodec;
        let bytes = codec.encode(&[u1, u2]).unwrap();
        let decoded = codec.decode(&bytes).unwrap();

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0]["id"], json!("u1"));
        assert_eq!(decoded[1]["email"], json!("b@x"));
    }

    #[test]
    fn nested_values_round_trip_via_json_cell() {
        let mut record = Record::new();
        record.insert("id".to_string(), json!("r1"));
        record.insert("tags".to_string(), json!(["a", "b"]));

        let codec = TabularCodec;
        let bytes = codec.encode(&[record]).unwrap();
        let decoded = codec.decode(&bytes).unwrap();

        assert_eq!(decoded[0]["tags"], json!(["a", "b"]));
    }

    #[test]
    fn children_field_is_never_emitted() {
        let mut record = Record::new();
        record.insert("id".to_string(), json!("r1"));
        record.insert(FIELD_CHILDREN.to_string(), json!([]));

        let codec = TabularCodec;
        let bytes = codec.encode(&[record]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("children"));
    }

    #[test]
    fn empty_cell_becomes_null() {
        let mut a = Record::new();
        a.insert("id".to_string(), json!("a"));
        a.insert("nickname".to_string(), json!("bob"));
        let b = Record::new(); // lacks "nickname" entirely

        let codec = TabularCodec;
        let bytes = codec.encode(&[a, b]).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded[1]["nickname"], Value::Null);
    }
}

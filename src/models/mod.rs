pub mod query;
pub mod reference;
pub mod report;

pub use reference::ReferenceMetadata;
pub use report::{
    AmbiguousCandidate, FieldResolution, ImportError, ImportReport, ResolutionOutcome, ResolutionTrace,
};

/// A single migrated record. Records are schemaless key/value maps at the
/// core boundary — the codecs, enricher, and resolver all treat them
/// opaquely except for the handful of reserved fields called out in
/// `spec.md` §3.
pub type Record = serde_json::value::Map<String, serde_json::Value>;
pub type JsonValue = serde_json::Value;

pub const FIELD_ID: &str = "id";
pub const FIELD_ORIGINAL_ID: &str = "_original_id";
pub const FIELD_REFERENCES: &str = "_references";
pub const FIELD_CHILDREN: &str = "children";
pub const FIELD_PARENT_ID: &str = "parent_id";
pub const FIELD_PARENT_UUID: &str = "parent_uuid";

/// Reads a record's `id` field as a string, if present.
pub fn record_id(record: &Record) -> Option<String> {
    record.get(FIELD_ID).and_then(value_as_id_string)
}

/// Reads a record's `_original_id` field as a string, if present.
pub fn original_id(record: &Record) -> Option<String> {
    record.get(FIELD_ORIGINAL_ID).and_then(value_as_id_string)
}

/// Reads a record's self-FK parent reference, checking `parent_id` and
/// `parent_uuid` interchangeably (`spec.md` §3/§4.10 step 2 name both as
/// valid self-FK field names).
pub fn parent_ref(record: &Record) -> Option<String> {
    record
        .get(FIELD_PARENT_ID)
        .or_else(|| record.get(FIELD_PARENT_UUID))
        .and_then(value_as_id_string)
}

/// True if `record` carries either self-FK field, regardless of value.
pub fn has_parent_ref(record: &Record) -> bool {
    record.contains_key(FIELD_PARENT_ID) || record.contains_key(FIELD_PARENT_UUID)
}

/// FK/id values are always strings per `spec.md` §3's candidate-FK rule, but
/// we're tolerant of numeric ids coming out of a codec's best-effort JSON
/// parse (C7 in particular parses every cell as JSON first).
fn value_as_id_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

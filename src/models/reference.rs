use serde::{Deserialize, Serialize};

use crate::models::JsonValue;

/// An entry under `_references[<fk_field>]`, attached by the enricher (C3)
/// and consumed by the import resolver (C10). See `spec.md` §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMetadata {
    pub resource_type: String,
    pub original_id: JsonValue,
    pub lookup_field: String,
    pub lookup_value: JsonValue,
}

impl ReferenceMetadata {
    pub fn self_fk(resource_type: impl Into<String>, original_id: JsonValue) -> Self {
        Self {
            resource_type: resource_type.into(),
            lookup_field: "_original_id".to_string(),
            lookup_value: original_id.clone(),
            original_id,
        }
    }
}

//! C2 — Lookup Policy. Pure, synchronous. See `spec.md` §4.2.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::models::query::LookupConfig;

static BUILTIN_DEFAULTS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        ("users", ["email"].as_slice()),
        ("projects", ["name"].as_slice()),
        ("roles", ["name"].as_slice()),
    ])
});

const FALLBACK: &[&str] = &["name"];

/// Resolution order: explicit `user_config[resource_type]`, then built-in
/// defaults, then the fallback `["name"]`.
pub fn lookup_fields_for(resource_type: &str, user_config: &LookupConfig) -> Vec<String> {
    if let Some(fields) = user_config.get(resource_type) {
        return fields.clone();
    }

    if let Some(fields) = BUILTIN_DEFAULTS.get(resource_type) {
        return fields.iter().map(|f| f.to_string()).collect();
    }

    FALLBACK.iter().map(|f| f.to_string()).collect()
}

/// Picks the first field in `lookup_fields_for`'s order whose value is
/// non-null in `record`, returning `(field, value)`.
pub fn first_non_null_field<'a>(
    resource_type: &str,
    user_config: &LookupConfig,
    record: &'a serde_json::Map<String, serde_json::Value>,
) -> Option<(String, &'a serde_json::Value)> {
    lookup_fields_for(resource_type, user_config)
        .into_iter()
        .find_map(|field| match record.get(&field) {
            Some(value) if !value.is_null() => Some((field, value)),
            _ => None,
        })
}

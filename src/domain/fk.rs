//! C1 — FK Field Detector. Pure, synchronous, no I/O. See `spec.md` §4.1.

use crate::models::JsonValue;

/// The result of classifying a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldClass {
    Scalar,
    SelfFk,
    ExternalFk { resource_type: String },
}

const RESERVED: &[&str] = &["id", "_original_id"];

/// Classifies `field_name` given its current `value`.
///
/// Idempotent and pure per `spec.md` §4.1. A field with a `null` value is
/// still classified by name (so the invariant "a null FK is classified but
/// produces no resolution attempt" holds); a field whose value is some
/// other non-string, non-null shape (e.g. a number or nested object) is
/// never a candidate FK regardless of its name, since the candidate rule
/// requires a string value.
pub fn classify(field_name: &str, value: &JsonValue) -> FieldClass {
    if RESERVED.contains(&field_name) {
        return FieldClass::Scalar;
    }

    let Some(stem) = candidate_stem(field_name) else {
        return FieldClass::Scalar;
    };

    if !matches!(value, JsonValue::Null | JsonValue::String(_)) {
        return FieldClass::Scalar;
    }

    if field_name == "parent_id" || field_name == "parent_uuid" {
        return FieldClass::SelfFk;
    }

    FieldClass::ExternalFk {
        resource_type: pluralize(stem),
    }
}

/// Strips a trailing `_id`/`_uuid` suffix, returning the bare stem, unless
/// the field is one of the reserved names.
fn candidate_stem(field_name: &str) -> Option<&str> {
    field_name
        .strip_suffix("_id")
        .or_else(|| field_name.strip_suffix("_uuid"))
        .filter(|stem| !stem.is_empty())
}

fn pluralize(stem: &str) -> String {
    if stem.ends_with('s') {
        stem.to_string()
    } else {
        format!("{stem}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_and_original_id_are_never_fks() {
        assert_eq!(classify("id", &json!("u1")), FieldClass::Scalar);
        assert_eq!(classify("_original_id", &json!("u1")), FieldClass::Scalar);
    }

    #[test]
    fn parent_id_and_parent_uuid_are_self_fks() {
        assert_eq!(classify("parent_id", &json!("c1")), FieldClass::SelfFk);
        assert_eq!(classify("parent_uuid", &json!("c1")), FieldClass::SelfFk);
    }

    #[test]
    fn external_fk_infers_pluralized_resource_type() {
        assert_eq!(
            classify("assigned_to_id", &json!("u1")),
            FieldClass::ExternalFk {
                resource_type: "assigned_tos".to_string()
            }
        );
        assert_eq!(
            classify("project_id", &json!("p1")),
            FieldClass::ExternalFk {
                resource_type: "projects".to_string()
            }
        );
        // Already plural stems are not re-pluralized.
        assert_eq!(
            classify("credentials_id", &json!("c1")),
            FieldClass::ExternalFk {
                resource_type: "credentials".to_string()
            }
        );
    }

    #[test]
    fn non_string_non_null_value_is_scalar() {
        assert_eq!(classify("project_id", &json!(42)), FieldClass::Scalar);
        assert_eq!(classify("project_id", &json!(["a"])), FieldClass::Scalar);
    }

    #[test]
    fn null_value_is_still_classified() {
        assert_eq!(
            classify("project_id", &JsonValue::Null),
            FieldClass::ExternalFk {
                resource_type: "projects".to_string()
            }
        );
        assert_eq!(classify("parent_id", &JsonValue::Null), FieldClass::SelfFk);
    }

    #[test]
    fn unsuffixed_fields_are_scalar() {
        assert_eq!(classify("name", &json!("hi")), FieldClass::Scalar);
        assert_eq!(classify("email", &json!("a@x")), FieldClass::Scalar);
    }
}

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::models::JsonValue;

/// The per-field resolution outcome recorded by the import resolver's
/// per-record state machine (`spec.md` §4.10). Exactly one of these is
/// recorded per FK field per record (testable property 5).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved { target_id: String },
    Missing,
    Ambiguous { candidates: Vec<AmbiguousCandidate> },
    /// S2: no `_references` entry and no session mapping. The field is
    /// carried through verbatim; `spec.md` §9 leaves target tolerance of a
    /// raw source id to the target, so this is reported but not fatal.
    Unenriched,
}

#[derive(Debug, Clone, Serialize)]
pub struct AmbiguousCandidate {
    pub id: String,
    pub distinguishing_fields: BTreeMap<String, JsonValue>,
}

/// One field-level resolution, folded into a record's `ResolutionTrace`.
#[derive(Debug, Clone, Serialize)]
pub struct FieldResolution {
    pub field: String,
    pub outcome: ResolutionOutcome,
}

/// The per-record trace of FK resolution decisions, in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionTrace {
    pub record_index: usize,
    pub original_id: Option<String>,
    pub fields: Vec<FieldResolution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportError {
    pub record_index: usize,
    pub message: String,
}

/// Aggregated outcome of one import request. Request-scoped; discarded once
/// the response is written (`spec.md` §5, "Stateless by design").
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub auto_resolved: usize,
    pub ambiguous: usize,
    pub missing: usize,
    pub session_id_map: BTreeMap<String, String>,
    pub traces: Vec<ResolutionTrace>,
    pub errors: Vec<ImportError>,
    pub warnings: Vec<String>,
    #[serde(with = "duration_as_secs")]
    pub duration: Duration,
}

impl ImportReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            successful: 0,
            failed: 0,
            auto_resolved: 0,
            ambiguous: 0,
            missing: 0,
            session_id_map: BTreeMap::new(),
            traces: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            duration: Duration::default(),
        }
    }
}

mod duration_as_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

//! C10 — Import Orchestrator. See `spec.md` §4.10.

use std::collections::BTreeMap;
use std::time::Instant;

use serde_json::Value;

use crate::client::{sibling_collection_url, Credential, ResourceClient};
use crate::codec::diagram::DiagramCodec;
use crate::codec::document::DocumentCodec;
use crate::codec::tabular::TabularCodec;
use crate::codec::RecordCodec;
use crate::domain::fk::{self, FieldClass};
use crate::domain::topo;
use crate::error::AppError;
use crate::models::query::{DiagramDialect, ExportFormat, LookupConfig, ResolutionPolicy};
use crate::models::{
    AmbiguousCandidate, FieldResolution, ImportError, ImportReport, Record, ReferenceMetadata,
    ResolutionOutcome, ResolutionTrace, FIELD_CHILDREN, FIELD_ORIGINAL_ID, FIELD_REFERENCES,
};

pub struct ImportRequest<'a> {
    pub target_url: &'a str,
    pub format: ExportFormat,
    pub body: &'a [u8],
    pub on_ambiguous: ResolutionPolicy,
    pub on_missing: ResolutionPolicy,
    pub detect_cycles: bool,
    /// Carried for parity with the operation's signature; the per-record
    /// protocol resolves entirely off `_references`, which already pins
    /// down a lookup field at export time.
    pub lookup_config: LookupConfig,
}

/// The import orchestrator's result: the accumulated report, plus whether a
/// `fail`-policy resolution aborted the run early (`spec.md` §4.10's
/// "400-class report" terminal case, §8 scenario S4). The body is always the
/// report; `aborted` only changes the HTTP status the controller selects.
pub struct ImportOutcome {
    pub report: ImportReport,
    pub aborted: bool,
}

pub async fn import(
    client: &ResourceClient,
    credential: &Credential,
    request: ImportRequest<'_>,
) -> Result<ImportOutcome, AppError> {
    let started = Instant::now();

    let codec: Box<dyn RecordCodec> = match request.format {
        ExportFormat::Json => Box::new(DocumentCodec),
        ExportFormat::Csv => Box::new(TabularCodec),
        ExportFormat::Mermaid => Box::new(DiagramCodec {
            dialect: DiagramDialect::Flowchart,
            resource_type: String::new(),
            lookup_config: LookupConfig::new(),
        }),
    };

    let mut records = codec.decode(request.body).map_err(AppError::Decode)?;

    for record in records.iter_mut() {
        if !record.contains_key(FIELD_ORIGINAL_ID) {
            if let Some(id) = record.get("id").cloned() {
                record.insert(FIELD_ORIGINAL_ID.to_string(), id);
            }
        }
    }

    let has_self_fk = records.iter().any(crate::models::has_parent_ref);

    if has_self_fk {
        let (ordered, cycle_report) = topo::topo_sort(records, request.detect_cycles);
        records = ordered;
        if !cycle_report.is_empty() {
            tracing::warn!(
                cyclic_ids = ?cycle_report.cyclic_ids,
                "parent-pointer cycle detected; affected records keep input order and resolve their self-FK per-record"
            );
        }
    }

    let mut report = ImportReport::new(records.len());
    let mut aborted = false;

    'records: for (index, record) in records.into_iter().enumerate() {
        let original_id = crate::models::original_id(&record);
        let mut record = record;
        let mut fields = Vec::new();
        let mut record_aborted = false;

        let fk_fields: Vec<(String, Value, FieldClass)> = record
            .iter()
            .filter(|(name, value)| !value.is_null() && name.as_str() != FIELD_REFERENCES)
            .filter_map(|(name, value)| match fk::classify(name, value) {
                FieldClass::Scalar => None,
                class => Some((name.clone(), value.clone(), class)),
            })
            .collect();

        for (field, value, class) in fk_fields {
            let outcome = resolve_field(
                &field,
                &value,
                &class,
                &record,
                request.target_url,
                client,
                credential,
                &mut report.session_id_map,
            )
            .await;

            match &outcome {
                ResolutionOutcome::Resolved { target_id } => {
                    record.insert(field.clone(), Value::String(target_id.clone()));
                    report.auto_resolved += 1;
                }
                ResolutionOutcome::Missing => {
                    if matches!(request.on_missing, ResolutionPolicy::Fail) {
                        report.errors.push(ImportError {
                            record_index: index,
                            message: format!("missing reference for field {field:?} aborted the import"),
                        });
                        record_aborted = true;
                    } else {
                        record.insert(field.clone(), Value::Null);
                        report.missing += 1;
                    }
                }
                ResolutionOutcome::Ambiguous { .. } => {
                    if matches!(request.on_ambiguous, ResolutionPolicy::Fail) {
                        report.errors.push(ImportError {
                            record_index: index,
                            message: format!("ambiguous reference for field {field:?} aborted the import"),
                        });
                        record_aborted = true;
                    } else {
                        record.insert(field.clone(), Value::Null);
                        report.ambiguous += 1;
                    }
                }
                ResolutionOutcome::Unenriched => {
                    report
                        .warnings
                        .push(format!("record {index} field {field:?}: no reference metadata, value carried through verbatim"));
                }
            }

            let stop = record_aborted;
            fields.push(FieldResolution { field, outcome });
            if stop {
                break;
            }
        }

        report.traces.push(ResolutionTrace {
            record_index: index,
            original_id: original_id.clone(),
            fields,
        });

        if record_aborted {
            aborted = true;
            break 'records;
        }

        let mut to_post = record;
        to_post.remove(FIELD_ORIGINAL_ID);
        to_post.remove(FIELD_REFERENCES);
        to_post.remove(FIELD_CHILDREN);

        match client.create(request.target_url, &to_post, credential).await {
            Ok(created) => {
                report.successful += 1;
                if let (Some(original_id), Some(new_id)) = (original_id, crate::models::record_id(&created)) {
                    report.session_id_map.insert(original_id, new_id);
                }
            }
            Err(e) => {
                report.failed += 1;
                report.errors.push(ImportError {
                    record_index: index,
                    message: e.to_string(),
                });
            }
        }
    }

    report.duration = started.elapsed();
    Ok(ImportOutcome { report, aborted })
}

/// Runs the per-field resolution state machine of `spec.md` §4.10: S0
/// (session map short-circuit for self-FKs), S1 (lookup query against the
/// reference's `_references` sidecar), S2 (no metadata at all).
async fn resolve_field(
    field: &str,
    value: &Value,
    class: &FieldClass,
    record: &Record,
    target_url: &str,
    client: &ResourceClient,
    credential: &Credential,
    session_id_map: &mut BTreeMap<String, String>,
) -> ResolutionOutcome {
    if matches!(class, FieldClass::SelfFk) {
        if let Some(source_id) = value.as_str() {
            if let Some(target_id) = session_id_map.get(source_id) {
                return ResolutionOutcome::Resolved {
                    target_id: target_id.clone(),
                };
            }
        }
    }

    let reference = record
        .get(FIELD_REFERENCES)
        .and_then(|refs| refs.get(field))
        .and_then(|meta| serde_json::from_value::<ReferenceMetadata>(meta.clone()).ok());

    let Some(reference) = reference else {
        return ResolutionOutcome::Unenriched;
    };

    let base = match sibling_collection_url(target_url, &reference.resource_type) {
        Ok(base) => base,
        Err(_) => return ResolutionOutcome::Missing,
    };

    let candidates = match client
        .query(&base, &reference.lookup_field, &reference.lookup_value, credential)
        .await
    {
        Ok(candidates) => candidates,
        Err(_) => return ResolutionOutcome::Missing,
    };

    match candidates.len() {
        1 => match crate::models::record_id(&candidates[0]) {
            Some(target_id) => ResolutionOutcome::Resolved { target_id },
            None => ResolutionOutcome::Missing,
        },
        0 => ResolutionOutcome::Missing,
        _ => ResolutionOutcome::Ambiguous {
            candidates: candidates
                .iter()
                .filter_map(|candidate| {
                    let id = crate::models::record_id(candidate)?;
                    let distinguishing_fields: BTreeMap<String, Value> = candidate
                        .iter()
                        .filter(|(k, _)| k.as_str() != "id")
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    Some(AmbiguousCandidate {
                        id,
                        distinguishing_fields,
                    })
                })
                .collect(),
        },
    }
}

//! C3 — Reference Enricher. See `spec.md` §4.3.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::fk::{self, FieldClass};
use crate::domain::lookup;
use crate::models::query::LookupConfig;
use crate::models::{Record, ReferenceMetadata, FIELD_ORIGINAL_ID, FIELD_REFERENCES};

/// Suggested cap on concurrent referent fetches per record (`spec.md` §5).
pub const MAX_FANOUT: usize = 8;

/// Fetches a single record by id from a resource collection. Implemented by
/// the HTTP client collaborator against the source endpoint; out of scope
/// per `spec.md` §1, so only the interface lives here.
#[async_trait]
pub trait ReferentFetcher: Send + Sync {
    async fn fetch_by_id(&self, resource_type: &str, id: &str) -> anyhow::Result<Option<Record>>;
}

/// Memoizes `ReferentFetcher` results for the lifetime of one export
/// request, keyed by `(resource_type, id)`.
pub struct CachingFetcher<'a> {
    inner: &'a dyn ReferentFetcher,
    cache: Mutex<HashMap<(String, String), Option<Record>>>,
}

impl<'a> CachingFetcher<'a> {
    pub fn new(inner: &'a dyn ReferentFetcher) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn fetch(&self, resource_type: &str, id: &str) -> anyhow::Result<Option<Record>> {
        let key = (resource_type.to_string(), id.to_string());
        if let Some(hit) = self.cache.lock().await.get(&key) {
            return Ok(hit.clone());
        }
        let result = self.inner.fetch_by_id(resource_type, id).await?;
        self.cache.lock().await.insert(key, result.clone());
        Ok(result)
    }
}

/// Enriches every record of `resource_type` in place with `_original_id`
/// and a `_references` sidecar (`spec.md` §4.3, steps 1-3). `fanout_width`
/// bounds concurrent referent fetches per record (`spec.md` §5); callers
/// pass `config::settings().resolution.fanout_width`, which defaults to
/// `MAX_FANOUT`.
pub async fn enrich(
    records: &mut [Record],
    resource_type: &str,
    fetcher: &CachingFetcher<'_>,
    lookup_config: &LookupConfig,
    fanout_width: usize,
) {
    for record in records.iter_mut() {
        enrich_record(record, resource_type, fetcher, lookup_config, fanout_width).await;
    }
}

async fn enrich_record(
    record: &mut Record,
    resource_type: &str,
    fetcher: &CachingFetcher<'_>,
    lookup_config: &LookupConfig,
    fanout_width: usize,
) {
    if let Some(id) = record.get("id").cloned() {
        record.insert(FIELD_ORIGINAL_ID.to_string(), id);
    }

    // Collect classified FK fields first: we can't hold a borrow of
    // `record` across the `.await` points below.
    let candidates: Vec<(String, Value, FieldClass)> = record
        .iter()
        .filter(|(_, value)| !value.is_null())
        .filter_map(|(name, value)| match fk::classify(name, value) {
            FieldClass::Scalar => None,
            class => Some((name.clone(), value.clone(), class)),
        })
        .collect();

    let resolved: Vec<(String, ReferenceMetadata)> = stream::iter(candidates)
        .map(|(field, value, class)| resolve_one(field, value, class, resource_type, fetcher, lookup_config))
        .buffer_unordered(fanout_width.max(1))
        .filter_map(|resolution| async move { resolution })
        .collect()
        .await;

    if !resolved.is_empty() {
        let mut references = serde_json::Map::new();
        for (field, meta) in resolved {
            references.insert(
                field,
                serde_json::to_value(meta).expect("ReferenceMetadata always serializes"),
            );
        }
        record.insert(FIELD_REFERENCES.to_string(), Value::Object(references));
    }
}

async fn resolve_one(
    field: String,
    value: Value,
    class: FieldClass,
    resource_type: &str,
    fetcher: &CachingFetcher<'_>,
    lookup_config: &LookupConfig,
) -> Option<(String, ReferenceMetadata)> {
    match class {
        FieldClass::SelfFk => Some((field, ReferenceMetadata::self_fk(resource_type, value))),
        FieldClass::ExternalFk { resource_type: referent_type } => {
            let id = value.as_str()?.to_string();
            // A fetch failure (network error or not-found) is silently
            // skipped; import-side resolution will later report it missing.
            let referent = fetcher.fetch(&referent_type, &id).await.ok().flatten()?;
            let (lookup_field, lookup_value) =
                lookup::first_non_null_field(&referent_type, lookup_config, &referent)?;
            Some((
                field,
                ReferenceMetadata {
                    resource_type: referent_type,
                    original_id: value,
                    lookup_field,
                    lookup_value: lookup_value.clone(),
                },
            ))
        }
        FieldClass::Scalar => None,
    }
}

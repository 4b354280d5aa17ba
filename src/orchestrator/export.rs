//! C9 — Export Orchestrator. See `spec.md` §4.9.

use async_trait::async_trait;

use crate::client::{resource_name, sibling_collection_url, Credential, ResourceClient};
use crate::codec::diagram::DiagramCodec;
use crate::codec::document::DocumentCodec;
use crate::codec::tabular::TabularCodec;
use crate::codec::RecordCodec;
use crate::domain::enrich::{self, CachingFetcher, ReferentFetcher};
use crate::domain::tree;
use crate::error::AppError;
use crate::models::query::{DiagramDialect, ExportFormat, LookupConfig};
use crate::models::Record;

pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

pub struct ExportRequest<'a> {
    pub source_url: &'a str,
    pub format: ExportFormat,
    pub enrich: bool,
    pub tree: bool,
    pub diagram_dialect: DiagramDialect,
    pub lookup_config: LookupConfig,
}

/// Adapts `ResourceClient` to the enricher's `ReferentFetcher` interface,
/// fetching sibling resource types off the same API root as the source
/// collection (`spec.md` §4.9 step 2).
struct HttpReferentFetcher<'a> {
    client: &'a ResourceClient,
    source_url: &'a str,
    credential: &'a Credential,
}

#[async_trait]
impl<'a> ReferentFetcher for HttpReferentFetcher<'a> {
    async fn fetch_by_id(&self, resource_type: &str, id: &str) -> anyhow::Result<Option<Record>> {
        let base = sibling_collection_url(self.source_url, resource_type)?;
        self.client.get_by_id(&base, id, self.credential).await
    }
}

/// Fetches, optionally enriches and nests, then encodes the source
/// collection per `request`.
pub async fn export(
    client: &ResourceClient,
    credential: &Credential,
    request: ExportRequest<'_>,
) -> Result<ExportOutput, AppError> {
    let mut records = client
        .list(request.source_url, credential)
        .await
        .map_err(AppError::UpstreamUnavailable)?;

    let resource_type = resource_name(request.source_url);

    // Enrichment only makes sense for the document codec: tabular/diagram
    // carry FK identities as plain strings and re-derive hierarchy from
    // `parent_id` directly, so there's nothing for `_references` to enrich.
    if request.enrich && matches!(request.format, ExportFormat::Json) {
        let fetcher = HttpReferentFetcher {
            client,
            source_url: request.source_url,
            credential,
        };
        let caching = CachingFetcher::new(&fetcher);
        let fanout_width = crate::config::settings().resolution.fanout_width;
        enrich::enrich(&mut records, &resource_type, &caching, &request.lookup_config, fanout_width).await;
    }

    let codec: Box<dyn RecordCodec> = match request.format {
        ExportFormat::Json => Box::new(DocumentCodec),
        ExportFormat::Csv => Box::new(TabularCodec),
        ExportFormat::Mermaid => Box::new(DiagramCodec {
            dialect: request.diagram_dialect,
            resource_type: resource_type.clone(),
            lookup_config: request.lookup_config.clone(),
        }),
    };

    // Tabular ignores `tree` outright; diagram always emits hierarchically
    // off `parent_id` without needing the nested `children` shape.
    let shaped = if request.tree && matches!(request.format, ExportFormat::Json) {
        tree::nest(records).unwrap_or_else(|unchanged| unchanged)
    } else {
        records
    };

    let bytes = codec.encode(&shaped).map_err(AppError::Decode)?;

    Ok(ExportOutput {
        bytes,
        content_type: codec.media_type(),
        filename: format!("{resource_type}_export.{}", codec.extension()),
    })
}

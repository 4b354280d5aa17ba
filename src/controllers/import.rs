use axum::extract::{Multipart, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::config;
use crate::context::AppContext;
use crate::controllers::export::credential_from_headers;
use crate::error::AppError;
use crate::models::query::{parse_lookup_config, ImportParams};
use crate::orchestrator::{self, ImportRequest};

/// `POST /import` — `spec.md` §6. The file is carried as a single
/// multipart part (any field name; the first part present is used).
pub async fn create(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(params): Query<ImportParams>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let credential = credential_from_headers(&headers);

    if let crate::access_control::Decision::Deny =
        ctx.access_control().check(&credential).await.map_err(AppError::Other)?
    {
        return Err(AppError::Unauthorized);
    }

    let mut body = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Other(anyhow::anyhow!(e)))?
    {
        body = field
            .bytes()
            .await
            .map_err(|e| AppError::Other(anyhow::anyhow!(e)))?
            .to_vec();
        break;
    }

    let lookup_config = parse_lookup_config(params.lookup_config.as_deref())
        .map_err(AppError::Other)?;

    let resolution = &config::settings().resolution;
    let request = ImportRequest {
        target_url: &params.url,
        format: params.r#type,
        body: &body,
        on_ambiguous: params.on_ambiguous.unwrap_or(resolution.on_ambiguous),
        on_missing: params.on_missing.unwrap_or(resolution.on_missing),
        detect_cycles: params.detect_cycles.unwrap_or(resolution.detect_cycles),
        lookup_config,
    };

    let outcome = orchestrator::import(ctx.client(), &credential, request).await?;

    let status = if outcome.aborted {
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    } else {
        axum::http::StatusCode::OK
    };

    Ok((status, Json(outcome.report)).into_response())
}

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::client::Credential;
use crate::context::AppContext;
use crate::error::AppError;
use crate::models::query::{parse_lookup_config, ExportParams};
use crate::orchestrator::{self, ExportRequest};

/// `GET /export` — `spec.md` §6.
pub async fn show(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let credential = credential_from_headers(&headers);

    if let crate::access_control::Decision::Deny =
        ctx.access_control().check(&credential).await.map_err(AppError::Other)?
    {
        return Err(AppError::Unauthorized);
    }

    let lookup_config = parse_lookup_config(params.lookup_config.as_deref())
        .map_err(AppError::Other)?;

    let request = ExportRequest {
        source_url: &params.url,
        format: params.r#type,
        enrich: params.enrich,
        tree: params.tree,
        diagram_dialect: params.diagram_type,
        lookup_config,
    };

    let output = orchestrator::export(ctx.client(), &credential, request).await?;

    let mut response = output.bytes.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(output.content_type));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", output.filename)) {
        response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

pub(crate) fn credential_from_headers(headers: &HeaderMap) -> Credential {
    Credential::from_header_value(headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()))
}

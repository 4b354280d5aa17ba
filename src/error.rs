use std::error::Error;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::codec::CodecError;

/// Request-level failures, mapped to an HTTP response. Per-record failures
/// during import (`spec.md` §4.10, §7) are accumulated into `ImportReport`
/// instead and never constructed as a variant here.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A source or target call fails at the transport layer. Fatal for the
    /// request when it happens on the export path's initial source fetch or
    /// the access-control check; import's per-record POSTs and lookup
    /// queries catch transport failures themselves and record them in the
    /// report instead (`spec.md` §4.10 step 5).
    #[error("upstream unavailable")]
    UpstreamUnavailable(#[source] anyhow::Error),

    /// A source/target call returned a non-2xx where the core expected
    /// success outright (the export's initial fetch). Import's per-record
    /// lookups/POSTs handle rejection themselves.
    #[error("upstream rejected the request with status {status}")]
    UpstreamRejected { status: u16 },

    #[error("malformed request body")]
    Decode(#[from] CodecError),

    /// Resolution failed under a `fail` policy (`on_ambiguous`/`on_missing`),
    /// aborting the whole import per `spec.md` §4.10.
    #[error("{kind} reference could not be resolved for field {field:?} on record {record_index}")]
    ResolutionFailed {
        kind: ResolutionFailureKind,
        field: String,
        record_index: usize,
    },

    #[error("access denied")]
    Unauthorized,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy)]
pub enum ResolutionFailureKind {
    Ambiguous,
    Missing,
}

impl std::fmt::Display for ResolutionFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionFailureKind::Ambiguous => write!(f, "ambiguous"),
            ResolutionFailureKind::Missing => write!(f, "missing"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorWrapper {
    error: ProblemDetails,
}

impl ErrorWrapper {
    pub fn new(error: ProblemDetails) -> Self {
        Self { error }
    }
}

#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    title: String,
    detail: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamRejected { .. } => StatusCode::BAD_GATEWAY,
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::ResolutionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(status = ?status, message = ?self, details = ?self.source());
        }

        let body = Json(ErrorWrapper::new(ProblemDetails {
            title: self.to_string(),
            detail: self.source().map(ToString::to_string),
        }));

        (status, body).into_response()
    }
}

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Version {
    name: &'static str,
    version: &'static str,
}

/// `GET /version` — unauthenticated, `SPEC_FULL.md` §6.
pub async fn show() -> Json<Version> {
    Json(Version {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

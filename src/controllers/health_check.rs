use chrono::Utc;

/// `GET /health` — unauthenticated liveness probe (`SPEC_FULL.md` §6).
pub async fn show() -> String {
    Utc::now().to_rfc3339()
}

use axum::routing::{get, post};
use axum::Router;

use crate::context::AppContext;
use crate::controllers;
use crate::cors::cors_layer;

/// Assembles the top-level router (teacher convention: `startup::run`
/// builds the `Router` alongside the listener and server future; here the
/// two concerns are split so `cmd::serve` owns the listener/runtime).
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/export", get(controllers::export::show))
        .route("/import", post(controllers::import::create))
        .route("/health", get(controllers::health_check::show))
        .route("/version", get(controllers::version::show))
        .layer(cors_layer())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(ctx)
}

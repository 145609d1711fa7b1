use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::{Router, routing::get};

use super::handlers;
use super::handlers::probes::{healthz, livez};
use super::state::AppState;
use crate::conf::Settings;
use crate::prelude::Result;

pub async fn build_routes(settings: Settings) -> Result<Router> {
    let state = AppState::new(settings).await?;
    let app = Router::new()
        .route("/applicants", post(handlers::applicants::create))
        .route("/applicants", get(handlers::applicants::list))
        .route("/applicants/:id", get(handlers::applicants::get))
        .route(
            "/applicants/:id/sources/:source/retry",
            post(handlers::applicants::retry_source),
        )
        .route("/candidates", get(handlers::candidates::list))
        .route("/candidates/sync", post(handlers::candidates::sync))
        .route(
            "/candidates/:external_id/import",
            post(handlers::candidates::import),
        )
        .layer(DefaultBodyLimit::max(12 * 1024 * 1024))
        .route("/healthz", get(healthz))
        .route("/livez", get(livez))
        .with_state(state);

    Ok(app)
}

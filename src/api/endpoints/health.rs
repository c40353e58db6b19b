//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub catalog_version: &'static str,
    pub rules: usize,
}

/// `GET /health`: liveness plus the catalog the engine is running.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let catalog = ctx.core.catalog();
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        catalog_version: catalog.version(),
        rules: catalog.len(),
    })
}

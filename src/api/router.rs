//! API router.
//!
//! Layers, outermost first: CORS, body limit, `TraceLayer`, access log.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the full router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let web_dir = core.config.web_dir.clone();
    let max_upload_bytes = core.config.max_upload_bytes;
    let ctx = ApiContext::new(core);

    Router::new()
        .route("/", get(endpoints::web::index))
        .route("/health", get(endpoints::health::check))
        .route("/predict", post(endpoints::predict::predict))
        .route("/predict_multi", post(endpoints::predict::predict_multi))
        .route(
            "/reports",
            get(endpoints::reports::list).post(endpoints::reports::create),
        )
        .route(
            "/reports/:id",
            get(endpoints::reports::detail).delete(endpoints::reports::remove),
        )
        .route("/reports/:id/download", get(endpoints::reports::download))
        .route("/feedback", post(endpoints::feedback::submit))
        .nest_service("/static", ServeDir::new(web_dir))
        .with_state(ctx)
        // Innermost first.
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
}

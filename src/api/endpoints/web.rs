//! Frontend entry page. Assets under `/static` are served by `ServeDir`.

use axum::extract::State;
use axum::response::Html;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// `GET /`: `index.html` from the web directory.
pub async fn index(State(ctx): State<ApiContext>) -> Result<Html<String>, ApiError> {
    let path = ctx.core.config.web_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(Html(html)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound("index.html not found".into()))
        }
        Err(e) => Err(ApiError::Internal(format!("{}: {e}", path.display()))),
    }
}

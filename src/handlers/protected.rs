use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::security::gate::Identity;
use axum::{
    extract::{Extension, State},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Serve the application page to an authenticated caller
///
/// GET /api/index, GET /api/protected-route
pub async fn index_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, ApiError> {
    let path = &state.config.auth.index_file;

    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            debug!(username = %identity.username, file = %path.display(), "Serving index");
            Ok(Html(contents).into_response())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(file = %path.display(), "Index file missing");
            Err(ApiError::NotFound("Page not found".to_string()))
        }
        Err(e) => Err(ApiError::Internal(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

use crate::core::error::ApiError;
use crate::core::extract::JsonBody;
use crate::core::state::AppState;
use crate::models::api::{MessageResponse, SetCollectionRequest};
use crate::stores::active_collection::CallerScope;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;

/// Select the sheet that table reads/writes target for this caller
///
/// POST /api/setCollection  {"collection": "<name>"}
pub async fn set_collection_handler(
    State(state): State<Arc<AppState>>,
    scope: CallerScope,
    JsonBody(request): JsonBody<SetCollectionRequest>,
) -> Result<Response, ApiError> {
    let collection = request
        .collection
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Collection name required!".to_string()))?;

    let active = state.active_collections.select(scope.clone(), &collection);

    info!(scope = ?scope, collection = %active, "Active collection changed");

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: format!("Active collection set to {}", active),
        }),
    )
        .into_response())
}

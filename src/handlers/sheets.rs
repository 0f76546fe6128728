use crate::core::error::ApiError;
use crate::core::extract::JsonBody;
use crate::core::state::AppState;
use crate::models::api::{SheetNameRequest, SheetsResponse, SuccessResponse};
use crate::stores::sheet_registry::AddOutcome;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;

fn required_sheet_name(request: SheetNameRequest) -> Result<String, ApiError> {
    request
        .sheet_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::Validation("Sheet name required!".to_string()))
}

/// Register a new sheet name
///
/// POST /api/addSheet  {"sheetName": "<name>"}
///
/// A name that is already registered is reported with `success: false`
/// and status 200; the registry is left unchanged.
pub async fn add_sheet_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<SheetNameRequest>,
) -> Result<Response, ApiError> {
    let sheet_name = required_sheet_name(request)?;

    let documents = state
        .database
        .connect()
        .await
        .map_err(|e| ApiError::store("Error adding sheet", e))?;

    let outcome = documents
        .registry
        .add(&sheet_name)
        .await
        .map_err(|e| ApiError::store("Error adding sheet", e))?;

    let body = match outcome {
        AddOutcome::Added => {
            info!(sheet = %sheet_name, "Sheet added");
            SuccessResponse {
                success: true,
                message: "Sheet added successfully".to_string(),
            }
        }
        AddOutcome::AlreadyExists => {
            info!(sheet = %sheet_name, "Sheet already exists, not added");
            SuccessResponse {
                success: false,
                message: "Sheet already exists!".to_string(),
            }
        }
    };

    Ok((StatusCode::OK, Json(body)).into_response())
}

/// List registered sheet names in insertion order
///
/// GET /api/getSheets
pub async fn get_sheets_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let documents = state
        .database
        .connect()
        .await
        .map_err(|e| ApiError::store("Error fetching sheets", e))?;

    let sheets = documents.registry.names().await;

    Ok((StatusCode::OK, Json(SheetsResponse { sheets })).into_response())
}

/// Delete a sheet's registry entry and its table
///
/// DELETE /api/deleteSheet  {"sheetName": "<name>"}
///
/// 404 only when the name is in neither the registry nor the table store.
pub async fn delete_sheet_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<SheetNameRequest>,
) -> Result<Response, ApiError> {
    let sheet_name = required_sheet_name(request)?;

    let documents = state
        .database
        .connect()
        .await
        .map_err(|e| ApiError::store("Internal Server Error", e))?;

    let was_registered = documents
        .registry
        .remove(&sheet_name)
        .await
        .map_err(|e| ApiError::store("Internal Server Error", e))?;

    let had_table = documents
        .tables
        .delete(&sheet_name)
        .map_err(|e| ApiError::store("Internal Server Error", e))?;

    if !was_registered && !had_table {
        return Err(ApiError::NotFound("Sheet not found!".to_string()));
    }

    info!(
        sheet = %sheet_name,
        was_registered = was_registered,
        had_table = had_table,
        "Sheet deleted"
    );

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: format!("Sheet \"{}\" deleted.", sheet_name),
        }),
    )
        .into_response())
}

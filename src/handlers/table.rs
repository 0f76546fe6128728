use crate::core::error::ApiError;
use crate::core::extract::JsonBody;
use crate::core::state::AppState;
use crate::models::api::{MessageResponse, SaveTableRequest, TableMetadata, TableQuery, TableResponse};
use crate::models::sheet::{Table, DEFAULT_COLUMNS, DEFAULT_ROWS};
use crate::stores::active_collection::CallerScope;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Read the grid of the caller's active sheet
///
/// GET /api/getTable[?collection=<name>]
///
/// A sheet that was never saved reads as an empty 5x5 grid.
pub async fn get_table_handler(
    State(state): State<Arc<AppState>>,
    scope: CallerScope,
    Query(query): Query<TableQuery>,
) -> Result<Response, ApiError> {
    let collection = state
        .active_collections
        .resolve(&scope, query.collection.as_deref());

    let documents = state
        .database
        .connect()
        .await
        .map_err(|e| ApiError::store("Error fetching table data", e))?;

    let body = match documents.tables.get(&collection) {
        Some(table) => TableResponse {
            metadata: TableMetadata {
                rows: table.rows,
                columns: table.columns,
            },
            data: table.data.clone(),
        },
        None => {
            debug!(collection = %collection, "No saved table, returning default grid");
            TableResponse {
                metadata: TableMetadata {
                    rows: DEFAULT_ROWS,
                    columns: DEFAULT_COLUMNS,
                },
                data: Vec::new(),
            }
        }
    };

    Ok((StatusCode::OK, Json(body)).into_response())
}

/// Replace the grid of the caller's active sheet
///
/// POST /api/saveTable[?collection=<name>]  {"rows": n, "columns": n, "data": [...]}
pub async fn save_table_handler(
    State(state): State<Arc<AppState>>,
    scope: CallerScope,
    Query(query): Query<TableQuery>,
    JsonBody(request): JsonBody<SaveTableRequest>,
) -> Result<Response, ApiError> {
    let collection = state
        .active_collections
        .resolve(&scope, query.collection.as_deref());

    let documents = state
        .database
        .connect()
        .await
        .map_err(|e| ApiError::store("Error saving table data", e))?;

    let cell_count = request.data.len();
    let table = Table::new(collection.clone(), request.rows, request.columns, request.data);

    documents
        .tables
        .save(table)
        .map_err(|e| ApiError::store("Error saving table data", e))?;

    info!(
        collection = %collection,
        rows = request.rows,
        columns = request.columns,
        cells = cell_count,
        "Table saved"
    );

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Table data saved successfully".to_string(),
        }),
    )
        .into_response())
}

use crate::models::sheet::Cell;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct SetCollectionRequest {
    pub collection: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SheetNameRequest {
    #[serde(rename = "sheetName")]
    pub sheet_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveTableRequest {
    #[serde(default)]
    pub rows: u32,
    #[serde(default)]
    pub columns: u32,
    #[serde(default)]
    pub data: Vec<Cell>,
}

/// Per-request override of the caller's active collection
#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    pub collection: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SheetsResponse {
    pub sheets: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableMetadata {
    pub rows: u32,
    pub columns: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TableResponse {
    pub metadata: TableMetadata,
    pub data: Vec<Cell>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

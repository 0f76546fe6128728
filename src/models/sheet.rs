use serde::{Deserialize, Serialize};

/// Rows shown for a sheet that has never been saved
pub const DEFAULT_ROWS: u32 = 5;
/// Columns shown for a sheet that has never been saved
pub const DEFAULT_COLUMNS: u32 = 5;

/// A single valued cell in a sheet's grid
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: String,
}

impl Cell {
    pub fn new(row: u32, col: u32, value: impl Into<String>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
        }
    }
}

/// Grid record stored for one sheet
///
/// Saved wholesale: a save replaces every field, so cells missing from a
/// later snapshot are gone. `rows`/`columns` are not checked against the
/// cell coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    /// Sheet name this grid belongs to
    pub collection_name: String,
    pub rows: u32,
    pub columns: u32,
    /// Sparse list of valued cells
    pub data: Vec<Cell>,
}

impl Table {
    pub fn new(collection_name: impl Into<String>, rows: u32, columns: u32, data: Vec<Cell>) -> Self {
        Self {
            collection_name: collection_name.into(),
            rows,
            columns,
            data,
        }
    }
}

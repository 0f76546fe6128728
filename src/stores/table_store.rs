use crate::core::error::StoreError;
use crate::models::sheet::Table;
use crate::wal::wal::{Wal, WalOperation};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Grid records keyed by sheet name
pub struct TableStore {
    tables: DashMap<String, Arc<Table>>,
    wal: Arc<Wal>,
}

impl TableStore {
    pub fn new(wal: Arc<Wal>) -> Self {
        Self {
            tables: DashMap::new(),
            wal,
        }
    }

    pub fn get(&self, collection_name: &str) -> Option<Arc<Table>> {
        self.tables
            .get(collection_name)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Create or replace the record for `table.collection_name`
    ///
    /// The entry stays locked across the WAL append so the log order of
    /// two saves to the same sheet matches the order they land in memory.
    pub fn save(&self, table: Table) -> Result<(), StoreError> {
        let entry = self.tables.entry(table.collection_name.clone());

        self.wal.log_operation(&WalOperation::SaveTable {
            table: table.clone(),
        })?;
        entry.insert(Arc::new(table));
        Ok(())
    }

    /// Delete the record for a sheet
    ///
    /// Returns whether a record existed. Nothing is logged when it did not.
    pub fn delete(&self, collection_name: &str) -> Result<bool, StoreError> {
        match self.tables.entry(collection_name.to_string()) {
            Entry::Vacant(_) => Ok(false),
            Entry::Occupied(record) => {
                self.wal.log_operation(&WalOperation::DeleteTable {
                    collection_name: collection_name.to_string(),
                })?;
                record.remove();
                Ok(true)
            }
        }
    }

    pub fn restore(&mut self, table: Table) {
        self.tables
            .insert(table.collection_name.clone(), Arc::new(table));
    }

    pub fn forget(&mut self, collection_name: &str) {
        self.tables.remove(collection_name);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

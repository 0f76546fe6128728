use crate::core::error::StoreError;
use crate::wal::wal::{Wal, WalOperation};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of registering a sheet name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyExists,
}

/// The metadata record listing every known sheet name
///
/// `None` means no registry record has been written yet; it reads as an
/// empty list. Read-modify-write sequences hold the async mutex for their
/// whole duration so concurrent add/delete calls cannot drop each other's
/// updates.
pub struct SheetRegistry {
    names: Mutex<Option<Vec<String>>>,
    wal: Arc<Wal>,
}

impl SheetRegistry {
    pub fn new(wal: Arc<Wal>) -> Self {
        Self {
            names: Mutex::new(None),
            wal,
        }
    }

    /// Append a name in insertion order unless it is already registered
    pub async fn add(&self, name: &str) -> Result<AddOutcome, StoreError> {
        let mut names = self.names.lock().await;

        if names
            .as_ref()
            .is_some_and(|list| list.iter().any(|existing| existing == name))
        {
            return Ok(AddOutcome::AlreadyExists);
        }

        self.wal.log_operation(&WalOperation::AddSheet {
            name: name.to_string(),
        })?;
        names.get_or_insert_with(Vec::new).push(name.to_string());

        Ok(AddOutcome::Added)
    }

    /// Remove a name, returning whether it was registered
    pub async fn remove(&self, name: &str) -> Result<bool, StoreError> {
        let mut names = self.names.lock().await;

        let Some(list) = names.as_mut() else {
            return Ok(false);
        };
        let Some(position) = list.iter().position(|existing| existing == name) else {
            return Ok(false);
        };

        self.wal.log_operation(&WalOperation::RemoveSheet {
            name: name.to_string(),
        })?;
        list.remove(position);

        Ok(true)
    }

    pub async fn names(&self) -> Vec<String> {
        self.names.lock().await.clone().unwrap_or_default()
    }

    /// Replay an addition read back from the WAL
    pub fn restore_add(&mut self, name: String) {
        let list = self.names.get_mut().get_or_insert_with(Vec::new);
        if !list.contains(&name) {
            list.push(name);
        }
    }

    /// Replay a removal read back from the WAL
    pub fn restore_remove(&mut self, name: &str) {
        if let Some(list) = self.names.get_mut().as_mut() {
            list.retain(|existing| existing != name);
        }
    }
}

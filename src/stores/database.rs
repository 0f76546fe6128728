use crate::core::error::StoreError;
use crate::core::startup::apply_wal_operations;
use crate::stores::{sheet_registry::SheetRegistry, table_store::TableStore, user_store::UserStore};
use crate::wal::wal::Wal;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// When the document store is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectMode {
    /// Open at startup; the process refuses to start if that fails
    Eager,
    /// Open on first use; a failed attempt is retried by the next caller
    Lazy,
}

/// The three collections backed by one write-ahead log
pub struct Documents {
    pub users: UserStore,
    pub registry: SheetRegistry,
    pub tables: TableStore,
}

impl Documents {
    /// Open the WAL at `path` and rebuild every collection from it
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let wal = Wal::new(path.to_path_buf())
            .context("Failed to initialize WAL")
            .map_err(StoreError::Wal)?;
        let wal = Arc::new(wal);

        let operations = wal.replay().context("Failed to replay WAL")?;

        let mut documents = Documents {
            users: UserStore::new(Arc::clone(&wal)),
            registry: SheetRegistry::new(Arc::clone(&wal)),
            tables: TableStore::new(wal),
        };
        apply_wal_operations(&mut documents, &operations);

        info!(
            wal_path = %path.display(),
            operations_replayed = operations.len(),
            users_loaded = documents.users.len(),
            tables_loaded = documents.tables.len(),
            "Document store opened"
        );

        Ok(documents)
    }
}

/// Connection handle to the document store
///
/// The collections are opened at most once; every handler goes through
/// [`Database::connect`], which is a cheap clone once the store is open.
pub struct Database {
    path: PathBuf,
    connect_timeout: Duration,
    documents: OnceCell<Arc<Documents>>,
}

impl Database {
    pub fn new(path: PathBuf, connect_timeout: Duration) -> Self {
        Self {
            path,
            connect_timeout,
            documents: OnceCell::new(),
        }
    }

    pub async fn connect(&self) -> Result<Arc<Documents>, StoreError> {
        let documents = self
            .documents
            .get_or_try_init(|| async {
                let result = open_with_timeout(self.path.clone(), self.connect_timeout).await;
                if let Err(e) = &result {
                    error!(
                        wal_path = %self.path.display(),
                        error = %e,
                        "Failed to connect to document store"
                    );
                }
                result.map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(documents))
    }

    pub fn is_connected(&self) -> bool {
        self.documents.initialized()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn open_with_timeout(path: PathBuf, timeout: Duration) -> Result<Documents, StoreError> {
    let task = tokio::task::spawn_blocking(move || Documents::open(&path));

    match tokio::time::timeout(timeout, task).await {
        Err(_) => Err(StoreError::Timeout(timeout)),
        Ok(Err(join_error)) => Err(StoreError::Connect(join_error.to_string())),
        Ok(Ok(result)) => result,
    }
}

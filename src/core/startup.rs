use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::state::AppState;
use crate::models::user::User;
use crate::security::session::SessionStore;
use crate::stores::active_collection::{ActiveCollections, CallerScope};
use crate::stores::database::{ConnectMode, Documents};
use crate::utils::time::current_timestamp;
use crate::wal::wal::WalOperation;

// this runs every time the document store is opened
pub fn apply_wal_operations(documents: &mut Documents, operations: &[WalOperation]) {
    for op in operations {
        match op {
            WalOperation::AddUser {
                id,
                username,
                password_hash,
            } => {
                let user = User::new(id.clone(), username.clone(), password_hash.clone());
                documents.users.restore(user);
            }
            WalOperation::AddSheet { name } => {
                documents.registry.restore_add(name.clone());
            }
            WalOperation::RemoveSheet { name } => {
                documents.registry.restore_remove(name);
            }
            WalOperation::SaveTable { table } => {
                documents.tables.restore(table.clone());
            }
            WalOperation::DeleteTable { collection_name } => {
                documents.tables.forget(collection_name);
            }
        }
    }
}

/// Honor the configured connect mode
///
/// Eager mode opens the store now so a bad store location stops the
/// process before it binds a listener.
pub async fn prepare_database(state: &AppState) -> Result<()> {
    match state.config.store.connect_mode {
        ConnectMode::Eager => {
            info!(
                wal_path = %state.database.path().display(),
                "Connecting to document store"
            );
            state
                .database
                .connect()
                .await
                .context("Failed to connect to document store")?;
        }
        ConnectMode::Lazy => {
            info!(
                wal_path = %state.database.path().display(),
                "Document store will connect on first use"
            );
        }
    }
    Ok(())
}

/// Spawn a background task that periodically drops expired sessions
pub fn spawn_session_cleanup(sessions: Arc<SessionStore>, cleanup_interval: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval));

        loop {
            interval.tick().await;

            let removed = sessions.purge_expired(current_timestamp());

            if removed > 0 {
                info!(
                    removed_sessions = removed,
                    active_sessions = sessions.len(),
                    "Session cleanup completed"
                );
            } else {
                debug!("Session cleanup completed, no expired sessions found");
            }
        }
    });
}

/// Spawn a background task that drops active-sheet selections nobody has
/// used for `idle_ttl` seconds
pub fn spawn_selection_cleanup(
    selections: Arc<ActiveCollections>,
    cleanup_interval: u64,
    idle_ttl: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval));

        loop {
            interval.tick().await;

            let removed = selections.purge_idle(current_timestamp(), idle_ttl);

            if removed > 0 {
                info!(
                    removed_selections = removed,
                    active_selections = selections.len(),
                    "Selection cleanup completed"
                );
            } else {
                debug!("Selection cleanup completed, no idle selections found");
            }
        }
    })
}

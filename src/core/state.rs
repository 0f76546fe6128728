// Application state (AppState)

use crate::core::config::Config;
use crate::security::session::SessionStore;
use crate::security::token::TokenSigner;
use crate::stores::active_collection::ActiveCollections;
use crate::stores::database::Database;
use std::sync::Arc;

/// Shared application state
///
/// Contains all shared components that are accessed by request handlers.
/// All fields are wrapped in Arc for efficient cloning across threads.
#[derive(Clone)]
pub struct AppState {
    /// Document store holding users, the sheet registry and tables
    pub database: Arc<Database>,

    /// Per-caller active sheet selections
    pub active_collections: Arc<ActiveCollections>,

    /// Bearer token issuer/verifier
    pub tokens: Arc<TokenSigner>,

    /// Server-side sessions for the cookie login flow
    pub sessions: Arc<SessionStore>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let database = Arc::new(Database::new(
            config.store.wal_path(),
            config.store.connect_timeout(),
        ));

        let tokens = Arc::new(TokenSigner::new(
            &config.auth.jwt_secret,
            config.auth.token_ttl(),
        ));

        let sessions = Arc::new(SessionStore::new(
            &config.auth.session_secret,
            config.auth.session_ttl(),
        ));

        Self {
            database,
            active_collections: Arc::new(ActiveCollections::new(
                config.sheets.default_collection.clone(),
            )),
            tokens,
            sessions,
            config,
        }
    }
}

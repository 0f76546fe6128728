// Shared fixtures for handler and middleware tests

use crate::core::config::{AuthConfig, Config, LoggingConfig, ServerConfig, SheetsConfig, StoreConfig};
use crate::core::state::AppState;
use crate::security::gate::AuthStrategy;
use crate::stores::database::ConnectMode;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub fn create_test_config(temp_dir: &TempDir, strategy: AuthStrategy) -> Config {
    Config {
        server: ServerConfig {
            port: Some(8080),
            unix_socket: None,
            num_threads: 2,
        },
        store: StoreConfig {
            uri: temp_dir.path().join("sheets.wal").display().to_string(),
            connect_mode: ConnectMode::Lazy,
            connect_timeout_ms: 5000,
        },
        auth: AuthConfig {
            strategy,
            jwt_secret: "test-jwt-secret".to_string(),
            session_secret: "test-session-secret".to_string(),
            token_ttl: 3600,
            session_ttl: 3600,
            session_cleanup_interval: 300,
            index_file: temp_dir.path().join("index.html"),
        },
        sheets: SheetsConfig {
            default_collection: "defaultCollection".to_string(),
            selection_idle_ttl: 3600,
            selection_cleanup_interval: 300,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            console: true,
        },
    }
}

/// The returned `TempDir` owns the WAL; keep it alive for the whole test
pub fn create_test_state_with_strategy(strategy: AuthStrategy) -> (Arc<AppState>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir, strategy);
    (Arc::new(AppState::new(config)), temp_dir)
}

pub fn create_test_state() -> (Arc<AppState>, TempDir) {
    create_test_state_with_strategy(AuthStrategy::Token)
}

pub fn index_file(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("index.html")
}

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::security::gate::AuthStrategy;
use crate::stores::database::ConnectMode;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Filesystem path or `file://` URI of the write-ahead log
    #[serde(default = "default_store_uri")]
    pub uri: String,
    #[serde(default = "default_connect_mode")]
    pub connect_mode: ConnectMode,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_strategy")]
    pub strategy: AuthStrategy,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default)]
    pub session_secret: String,
    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl: u64,
    /// Session lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl: u64,
    #[serde(default = "default_session_cleanup_interval")]
    pub session_cleanup_interval: u64,
    /// File served by the protected index routes
    #[serde(default = "default_index_file")]
    pub index_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    #[serde(default = "default_collection")]
    pub default_collection: String,
    /// Seconds a caller's selection may sit unused before it is dropped
    #[serde(default = "default_selection_idle_ttl")]
    pub selection_idle_ttl: u64,
    #[serde(default = "default_selection_cleanup_interval")]
    pub selection_cleanup_interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

// Default value functions
fn default_port() -> Option<u16> {
    Some(5000)
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_store_uri() -> String {
    "data/sheets.wal".to_string()
}

fn default_connect_mode() -> ConnectMode {
    ConnectMode::Lazy
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_strategy() -> AuthStrategy {
    AuthStrategy::Token
}

fn default_token_ttl() -> u64 {
    3600 // 1 hour
}

fn default_session_ttl() -> u64 {
    86400 // 1 day
}

fn default_session_cleanup_interval() -> u64 {
    300 // 5 minutes
}

fn default_index_file() -> PathBuf {
    PathBuf::from("public/index.html")
}

fn default_collection() -> String {
    "defaultCollection".to_string()
}

fn default_selection_idle_ttl() -> u64 {
    86400 // 1 day
}

fn default_selection_cleanup_interval() -> u64 {
    300 // 5 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            unix_socket: None,
            num_threads: default_num_threads(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_store_uri(),
            connect_mode: default_connect_mode(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            jwt_secret: String::new(),
            session_secret: String::new(),
            token_ttl: default_token_ttl(),
            session_ttl: default_session_ttl(),
            session_cleanup_interval: default_session_cleanup_interval(),
            index_file: default_index_file(),
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            default_collection: default_collection(),
            selection_idle_ttl: default_selection_idle_ttl(),
            selection_cleanup_interval: default_selection_cleanup_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

impl StoreConfig {
    pub fn wal_path(&self) -> PathBuf {
        PathBuf::from(self.uri.strip_prefix("file://").unwrap_or(&self.uri))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }
}

impl Config {
    /// Load configuration: TOML file if present, then environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Apply `STORE_URI`, `JWT_SECRET`, `SESSION_SECRET`, `AUTH_STRATEGY`
    /// and `PORT` on top of the file values
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("STORE_URI") {
            self.store.uri = uri;
        }

        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(secret) = lookup("SESSION_SECRET") {
            self.auth.session_secret = secret;
        }

        if let Some(strategy) = lookup("AUTH_STRATEGY") {
            self.auth.strategy = match strategy.to_ascii_lowercase().as_str() {
                "token" => AuthStrategy::Token,
                "session" => AuthStrategy::Session,
                other => bail!(
                    "Invalid AUTH_STRATEGY '{}'. Must be one of: token, session",
                    other
                ),
            };
        }

        if let Some(port) = lookup("PORT") {
            let port = port
                .parse::<u16>()
                .context(format!("Invalid PORT '{}'", port))?;
            self.server.port = Some(port);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate server config
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        // Validate store config
        if self.store.uri.trim().is_empty() || self.store.uri.trim() == "file://" {
            bail!("store uri must not be empty");
        }

        if self.store.connect_timeout_ms == 0 {
            bail!("connect_timeout_ms must be greater than 0");
        }

        // Validate auth config
        match self.auth.strategy {
            AuthStrategy::Token if self.auth.jwt_secret.is_empty() => {
                bail!("jwt_secret must be set when auth strategy is 'token'");
            }
            AuthStrategy::Session if self.auth.session_secret.is_empty() => {
                bail!("session_secret must be set when auth strategy is 'session'");
            }
            _ => {}
        }

        if self.auth.token_ttl == 0 {
            bail!("token_ttl must be greater than 0");
        }

        if self.auth.session_ttl == 0 {
            bail!("session_ttl must be greater than 0");
        }

        if self.auth.session_cleanup_interval == 0 {
            bail!("session_cleanup_interval must be greater than 0");
        }

        // Validate sheets config
        if self.sheets.default_collection.trim().is_empty() {
            bail!("default_collection must not be empty");
        }

        if self.sheets.selection_idle_ttl == 0 {
            bail!("selection_idle_ttl must be greater than 0");
        }

        if self.sheets.selection_cleanup_interval == 0 {
            bail!("selection_cleanup_interval must be greater than 0");
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}

use crate::utils::time::{current_timestamp, expires_at, is_expired};
use dashmap::DashMap;

/// Header an unauthenticated client can send to keep its own selection
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Key under which an active-collection selection is stored
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallerScope {
    /// Authenticated user, by user id
    User(String),
    /// Unauthenticated client that identified itself with `X-Client-Id`
    Client(String),
    /// Everyone else shares one selection
    Anonymous,
}

#[derive(Debug, Clone)]
struct Selection {
    collection: String,
    /// Unix timestamp of the last request that read or wrote this selection
    last_used: i64,
}

/// Which sheet each caller's table reads and writes target
///
/// Selections live only in memory; a restart resets every caller to the
/// default collection. Names are not checked against the registry.
/// Selections idle for longer than the configured TTL are dropped by
/// [`ActiveCollections::purge_idle`], after which the caller is back on
/// the default collection.
pub struct ActiveCollections {
    default_collection: String,
    selections: DashMap<CallerScope, Selection>,
}

impl ActiveCollections {
    pub fn new(default_collection: impl Into<String>) -> Self {
        Self {
            default_collection: default_collection.into(),
            selections: DashMap::new(),
        }
    }

    /// Overwrite the caller's selection and return the new value
    pub fn select(&self, scope: CallerScope, collection: &str) -> String {
        self.select_at(scope, collection, current_timestamp())
    }

    pub fn select_at(&self, scope: CallerScope, collection: &str, now: i64) -> String {
        self.selections.insert(
            scope,
            Selection {
                collection: collection.to_string(),
                last_used: now,
            },
        );
        collection.to_string()
    }

    pub fn current(&self, scope: &CallerScope) -> String {
        self.current_at(scope, current_timestamp())
    }

    /// Read the caller's selection, refreshing its idle timer
    pub fn current_at(&self, scope: &CallerScope, now: i64) -> String {
        match self.selections.get_mut(scope) {
            Some(mut selection) => {
                selection.last_used = now;
                selection.collection.clone()
            }
            None => self.default_collection.clone(),
        }
    }

    /// Resolve the target sheet for one request
    ///
    /// A non-empty `override_collection` wins over the stored selection
    /// without replacing it.
    pub fn resolve(&self, scope: &CallerScope, override_collection: Option<&str>) -> String {
        match override_collection.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => self.current(scope),
        }
    }

    /// Drop selections unused for `idle_ttl_seconds`, returning how many went
    pub fn purge_idle(&self, now: i64, idle_ttl_seconds: u64) -> usize {
        let before = self.selections.len();
        self.selections.retain(|_, selection| {
            !is_expired(expires_at(selection.last_used, idle_ttl_seconds), now)
        });
        before.saturating_sub(self.selections.len())
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

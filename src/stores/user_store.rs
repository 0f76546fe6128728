use crate::core::error::StoreError;
use crate::models::user::User;
use crate::wal::wal::{Wal, WalOperation};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Credential store keyed by username
pub struct UserStore {
    users: DashMap<String, Arc<User>>,
    wal: Arc<Wal>,
}

impl UserStore {
    pub fn new(wal: Arc<Wal>) -> Self {
        Self {
            users: DashMap::new(),
            wal,
        }
    }

    /// Insert a new user, refusing duplicates
    ///
    /// Returns `Ok(false)` when the username is already taken. The WAL entry
    /// is written before the user becomes visible.
    pub fn insert(&self, user: User) -> Result<bool, StoreError> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                self.wal.log_operation(&WalOperation::add_user(&user))?;
                slot.insert(Arc::new(user));
                Ok(true)
            }
        }
    }

    /// Restore a user read back from the WAL
    pub fn restore(&mut self, user: User) {
        self.users.insert(user.username.clone(), Arc::new(user));
    }

    pub fn get(&self, username: &str) -> Option<Arc<User>> {
        self.users.get(username).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

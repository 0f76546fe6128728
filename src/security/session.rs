use std::time::Duration;

use dashmap::DashMap;

use crate::core::error::AuthError;
use crate::models::user::User;
use crate::security::gate::Identity;
use crate::security::token::{hmac_sha256, signatures_match};
use crate::utils::time::{current_timestamp, expires_at, is_expired};

/// Name of the cookie carrying the signed session id
pub const SESSION_COOKIE: &str = "session";

#[derive(Clone, Debug)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    /// Unix timestamp after which the session is rejected
    pub expires_at: i64,
}

/// Server-side sessions for the cookie-based login flow
///
/// Cookie values are `<id>.<hmac>` where the HMAC is keyed with the session
/// secret, so a guessed id is useless without the secret.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    secret: Vec<u8>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            secret: secret.as_ref().to_vec(),
            ttl,
        }
    }

    /// Open a session for `user` and return the signed cookie value
    pub fn create(&self, user: &User) -> String {
        self.create_at(user, current_timestamp())
    }

    pub fn create_at(&self, user: &User, now: i64) -> String {
        let id = hex::encode(rand::random::<[u8; 16]>());

        self.sessions.insert(
            id.clone(),
            Session {
                user_id: user.id.clone(),
                username: user.username.clone(),
                expires_at: expires_at(now, self.ttl.as_secs()),
            },
        );

        self.sign(&id)
    }

    pub fn validate(&self, cookie_value: &str) -> Result<Identity, AuthError> {
        self.validate_at(cookie_value, current_timestamp())
    }

    pub fn validate_at(&self, cookie_value: &str, now: i64) -> Result<Identity, AuthError> {
        let id = self.unsign(cookie_value)?;

        let session = self
            .sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::InvalidSession)?;

        if is_expired(session.expires_at, now) {
            self.sessions.remove(id);
            return Err(AuthError::InvalidSession);
        }

        Ok(Identity {
            user_id: session.user_id,
            username: session.username,
        })
    }

    /// Drop the session behind a cookie; unknown or forged cookies are ignored
    pub fn revoke(&self, cookie_value: &str) -> bool {
        match self.unsign(cookie_value) {
            Ok(id) => self.sessions.remove(id).is_some(),
            Err(_) => false,
        }
    }

    /// Remove every expired session, returning how many were dropped
    pub fn purge_expired(&self, now: i64) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !is_expired(session.expires_at, now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn sign(&self, id: &str) -> String {
        let signature = hmac_sha256(&self.secret, id.as_bytes());
        format!("{}.{}", id, hex::encode(signature))
    }

    fn unsign<'a>(&self, cookie_value: &'a str) -> Result<&'a str, AuthError> {
        let (id, signature_hex) = cookie_value
            .split_once('.')
            .ok_or(AuthError::InvalidSession)?;
        let provided = hex::decode(signature_hex).map_err(|_| AuthError::InvalidSession)?;
        let expected = hmac_sha256(&self.secret, id.as_bytes());

        if signatures_match(&provided, &expected) {
            Ok(id)
        } else {
            Err(AuthError::InvalidSession)
        }
    }
}

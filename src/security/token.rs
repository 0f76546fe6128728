// Signed bearer tokens: hex(claims_json) "." hex(HMAC-SHA256(secret, claims_json))
//
// Claims carry the user id, the username and the issue/expiry timestamps.
// Nothing is stored server-side.

use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::core::error::AuthError;
use crate::models::user::User;
use crate::utils::time::{current_timestamp, expires_at, is_expired};

type HmacSha256 = Hmac<Sha256>;

/// Identity embedded in a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    /// Issued at, Unix seconds
    pub iat: i64,
    /// Expiry, Unix seconds
    pub exp: i64,
}

pub(crate) fn hmac_sha256(secret: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

pub(crate) fn signatures_match(provided: &[u8], expected: &[u8]) -> bool {
    provided.ct_eq(expected).into()
}

/// Issues and verifies bearer tokens
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> serde_json::Result<String> {
        self.issue_at(user, current_timestamp())
    }

    pub fn issue_at(&self, user: &User, now: i64) -> serde_json::Result<String> {
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            iat: now,
            exp: expires_at(now, self.ttl.as_secs()),
        };

        let payload = serde_json::to_vec(&claims)?;
        let signature = hmac_sha256(&self.secret, &payload);

        Ok(format!("{}.{}", hex::encode(payload), hex::encode(signature)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, current_timestamp())
    }

    /// Check signature first, then expiry
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let (payload_hex, signature_hex) =
            token.split_once('.').ok_or(AuthError::MalformedToken)?;

        let payload = hex::decode(payload_hex).map_err(|_| AuthError::MalformedToken)?;
        let provided = hex::decode(signature_hex).map_err(|_| AuthError::MalformedToken)?;

        let expected = hmac_sha256(&self.secret, &payload);
        if !signatures_match(&provided, &expected) {
            return Err(AuthError::InvalidSignature);
        }

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)?;

        if is_expired(claims.exp, now) {
            return Err(AuthError::Expired {
                expired_at: claims.exp,
                current_time: now,
            });
        }

        Ok(claims)
    }
}

use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// A credential issued at `issued_at` with lifetime `ttl` is expired once
/// `current_time` has moved past `issued_at + ttl`.
pub fn expires_at(issued_at: i64, ttl_seconds: u64) -> i64 {
    issued_at.saturating_add(i64::try_from(ttl_seconds).unwrap_or(i64::MAX))
}

pub fn is_expired(expires_at: i64, current_time: i64) -> bool {
    current_time >= expires_at
}

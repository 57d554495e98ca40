//! Token sessions and the principal source
//!
//! Only the SHA-256 of a token is stored, mapped to
//! `user_id|created_at|expires_at` (milliseconds, 0 = never expires).

use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{RbacError, Result};
use crate::guard::Principal;
use crate::store::{load, Store};

/// Supplies the principal for a presented credential, or None when the
/// credential is unknown or expired.
pub trait PrincipalSource {
    fn principal(&self, token: &str) -> Result<Option<Principal>>;
}

/// Hex encode
mod hex {
    pub fn encode(data: impl AsRef<[u8]>) -> String {
        data.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// Generate a random token (32 bytes, hex encoded)
pub fn generate_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).map_err(|e| RbacError::Random(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Hash token with SHA-256 for storage
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn parse_record(value: &str) -> Result<(u64, u64)> {
    let parts: Vec<&str> = value.split('|').collect();
    match parts.as_slice() {
        [user, _created, expires] => {
            let user = user.parse().map_err(|_| RbacError::CorruptRecord(value.into()))?;
            let expires = expires.parse().map_err(|_| RbacError::CorruptRecord(value.into()))?;
            Ok((user, expires))
        }
        _ => Err(RbacError::CorruptRecord(value.into())),
    }
}

fn expired(expires: u64, now: u64) -> bool {
    expires > 0 && expires < now
}

impl Store {
    /// Create a session for an existing user, returns the token.
    pub fn create_session(&self, user: u64, ttl_secs: Option<u64>) -> Result<String> {
        let token = generate_token()?;
        let hash = hash_token(&token);
        let now = now_millis();
        let expires = ttl_secs.map(|t| t.saturating_mul(1000).saturating_add(now)).unwrap_or(0);
        self.write(|d, tx| {
            if d.names.get(tx, &user)?.is_none() {
                return Err(RbacError::UserNotFound(user));
            }
            Ok(d.sessions.put(tx, &hash, &format!("{}|{}|{}", user, now, expires))?)
        })?;
        debug!(user, "session created");
        Ok(token)
    }

    /// The user a live token belongs to. An expired record is deleted.
    pub fn validate_session(&self, token: &str) -> Result<Option<u64>> {
        let hash = hash_token(token);
        let found = self.read(|d, tx| match d.sessions.get(tx, &hash)? {
            Some(value) => parse_record(value).map(Some),
            None => Ok(None),
        })?;
        let Some((user, expires)) = found else { return Ok(None) };
        if expired(expires, now_millis()) {
            self.write(|d, tx| Ok(d.sessions.delete(tx, &hash)?))?;
            debug!(user, "expired session removed");
            return Ok(None);
        }
        Ok(Some(user))
    }

    pub fn revoke_session(&self, token: &str) -> Result<bool> {
        let hash = hash_token(token);
        self.write(|d, tx| Ok(d.sessions.delete(tx, &hash)?))
    }

    /// Delete every expired session, returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = now_millis();
        let n = self.write(|d, tx| {
            let mut stale = Vec::new();
            for item in d.sessions.iter(tx)? {
                let (hash, value) = item?;
                let (_, expires) = parse_record(value)?;
                if expired(expires, now) {
                    stale.push(hash.to_string());
                }
            }
            for hash in &stale {
                d.sessions.delete(tx, hash)?;
            }
            Ok(stale.len())
        })?;
        if n > 0 {
            debug!(count = n, "expired sessions purged");
        }
        Ok(n)
    }
}

impl PrincipalSource for Store {
    fn principal(&self, token: &str) -> Result<Option<Principal>> {
        let Some(user) = self.validate_session(token)? else { return Ok(None) };
        self.read(|d, tx| load(d, tx, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_hex() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn record_parsing_rejects_garbage() {
        assert_eq!(parse_record("7|100|0").unwrap(), (7, 0));
        assert!(parse_record("7|100").is_err());
        assert!(parse_record("x|1|2").is_err());
    }

    #[test]
    fn never_and_future_expiry_are_live() {
        assert!(!expired(0, 1_000));
        assert!(!expired(2_000, 1_000));
        assert!(expired(999, 1_000));
    }
}

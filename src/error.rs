//! Error types for hackrbac

use thiserror::Error;

use crate::statement::{Action, Resource};

/// The main error type for role tables and the principal store.
///
/// Authorization denials are not errors; see [`crate::AuthorizationResult`].
#[derive(Debug, Error)]
pub enum RbacError {
    #[error("role {role} grants {action} on {resource}, which is not a legal action for that resource")]
    InvalidGrant {
        role: String,
        resource: Resource,
        action: Action,
    },
    #[error("role {0} is defined more than once")]
    DuplicateRole(String),
    #[error("store error: {0}")]
    Store(#[from] heed::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("user {0} already exists")]
    UserExists(String),
    #[error("user {0} not found")]
    UserNotFound(u64),
    #[error("already bootstrapped")]
    AlreadyBootstrapped,
    #[error("random source failed: {0}")]
    Random(String),
    #[error("corrupted record: {0}")]
    CorruptRecord(String),
}

/// Result type alias for hackrbac operations
pub type Result<T> = std::result::Result<T, RbacError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_grant_names_the_offending_pair() {
        let e = RbacError::InvalidGrant {
            role: "mentor".into(),
            resource: Resource::Configuration,
            action: Action::Join,
        };
        let s = e.to_string();
        assert!(s.contains("mentor"));
        assert!(s.contains("join"));
        assert!(s.contains("configuration"));
    }
}

//! Credential checks for mutating operations
//!
//! Every mutation of an existing session must present the secret issued at
//! creation. Records in a terminal state are treated as gone, so callers
//! cannot probe whether a closed session ever existed.

use crate::session::{SessionRecord, SessionStore};
use crate::{Error, Result};

/// Validates session-id + secret pairs against the store.
pub struct CredentialGuard;

impl CredentialGuard {
    /// Look up a live session and check its secret.
    ///
    /// A missing or terminal record fails with [`Error::SessionNotFound`];
    /// a wrong secret with [`Error::SecretMismatch`]. The comparison is
    /// constant-time so timing does not reveal how much of a guess matched.
    pub fn authorize(
        store: &SessionStore,
        session_id: &str,
        secret: &str,
    ) -> Result<SessionRecord> {
        let record = store
            .find_by_session_id(session_id)?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        if record.state.is_terminal() {
            return Err(Error::SessionNotFound(session_id.to_string()));
        }

        if !constant_time_eq(record.secret.as_bytes(), secret.as_bytes()) {
            return Err(Error::SecretMismatch);
        }

        Ok(record)
    }
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

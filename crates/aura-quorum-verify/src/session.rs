//! Session store
//!
//! Holds at most one verification session behind a mutex. The store has no
//! notion of seal state or thresholds; it only enforces session-local rules
//! (nonce binding and duplicate rejection) on the slot it guards.

use crate::errors::{VerifyError, VerifyResult};
use crate::secret::KeyShare;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque single-use session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionNonce(String);

impl SessionNonce {
    /// Generate a fresh random nonce
    #[allow(clippy::disallowed_methods)]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Nonce as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact string comparison against a caller-supplied nonce.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl fmt::Display for SessionNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An active verification session.
#[derive(Debug)]
pub struct VerifySession {
    nonce: SessionNonce,
    shares: Vec<KeyShare>,
}

impl VerifySession {
    fn new(nonce: SessionNonce) -> Self {
        Self {
            nonce,
            shares: Vec::new(),
        }
    }

    /// Nonce binding shares to this session
    pub fn nonce(&self) -> &SessionNonce {
        &self.nonce
    }

    /// Number of accepted shares
    pub fn progress(&self) -> usize {
        self.shares.len()
    }

    /// Accept a share for this session.
    ///
    /// Rejects a foreign nonce before looking at the share, then rejects a
    /// byte-identical resubmission. Neither rejection mutates the session.
    /// Returns the new share count.
    pub fn accept(&mut self, nonce: &str, share: KeyShare) -> VerifyResult<usize> {
        if !self.nonce.matches(nonce) {
            return Err(VerifyError::NonceMismatch {
                expected: self.nonce.to_string(),
            });
        }
        if self.shares.iter().any(|existing| existing.same_bytes(&share)) {
            return Err(VerifyError::DuplicateShare);
        }
        self.shares.push(share);
        Ok(self.shares.len())
    }

    /// Split into nonce and accumulated shares. Shares are scrubbed when the
    /// returned vector is dropped.
    pub fn into_parts(self) -> (SessionNonce, Vec<KeyShare>) {
        (self.nonce, self.shares)
    }
}

/// Single-slot store for the active session.
#[derive(Debug, Default)]
pub struct SessionStore {
    slot: Mutex<Option<VerifySession>>,
}

/// Exclusive access to the session slot.
pub type SessionSlot<'a> = MutexGuard<'a, Option<VerifySession>>;

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the session slot. Callers must already hold the host state lock.
    pub fn lock(&self) -> SessionSlot<'_> {
        self.slot.lock()
    }
}

/// Open a session in an empty slot.
pub fn open(slot: &mut Option<VerifySession>) -> VerifyResult<SessionNonce> {
    if slot.is_some() {
        return Err(VerifyError::AlreadyInProgress);
    }
    let nonce = SessionNonce::generate();
    *slot = Some(VerifySession::new(nonce.clone()));
    Ok(nonce)
}

/// Drop whatever session occupies the slot. Returns the discarded nonce.
pub fn clear(slot: &mut Option<VerifySession>) -> Option<SessionNonce> {
    slot.take().map(|session| session.into_parts().0)
}

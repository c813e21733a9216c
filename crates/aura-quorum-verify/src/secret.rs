//! Zeroizing wrappers for key shares and reconstructed secrets
//!
//! Both wrappers scrub their buffer when dropped. Neither implements `Clone`,
//! so sensitive bytes are only ever copied by an explicit call.

use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// One unseal or recovery key share as submitted by an operator.
pub struct KeyShare(Zeroizing<Vec<u8>>);

impl KeyShare {
    /// Wrap raw share bytes. The buffer is scrubbed when the share is dropped.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Copy a share out of a borrowed slice.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    /// Share length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the share is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw share bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Byte equality without early exit on the first differing byte.
    pub fn same_bytes(&self, other: &KeyShare) -> bool {
        self.0.len() == other.0.len() && bool::from(self.0.as_slice().ct_eq(other.0.as_slice()))
    }

    /// Reinterpret a share as the root secret. Used when the threshold is 1
    /// and the single share already is the secret.
    pub fn into_secret(self) -> RootSecret {
        RootSecret(self.0)
    }
}

impl fmt::Debug for KeyShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyShare")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

impl From<Vec<u8>> for KeyShare {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Reconstructed secret, or the root key derived from it.
pub struct RootSecret(Zeroizing<Vec<u8>>);

impl RootSecret {
    /// Wrap secret bytes. The buffer is scrubbed when dropped.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Borrow the secret bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Secret length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the secret is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RootSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootSecret(<redacted>)")
    }
}

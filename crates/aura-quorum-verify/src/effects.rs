//! Collaborator interfaces consumed by the coordinator
//!
//! The coordinator never talks to a concrete seal, barrier or combiner. It is
//! generic over [`QuorumVerifyEffects`], which composes the four capabilities
//! below. Hosts implement them once; tests implement them with in-memory mocks.
//!
//! # Lock ordering
//!
//! [`HostStatus::state_lock`] is the host-wide state lock shared with other
//! subsystems. The coordinator takes it (shared) before its own session lock
//! and releases it after, on every operation. Any subsystem that holds the
//! session lock must never then wait on the host lock.

use crate::errors::SealError;
use crate::secret::{KeyShare, RootSecret};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Seal and replication state of the host.
///
/// All reads happen while the caller holds [`HostStatus::state_lock`] shared.
pub trait HostStatus: Send + Sync {
    /// Host-wide state lock. Writers are seal/unseal/standby transitions.
    fn state_lock(&self) -> &RwLock<()>;

    /// Whether the host is sealed
    fn is_sealed(&self) -> bool;

    /// Whether the host is a passive standby replica
    fn is_standby(&self) -> bool;

    /// Whether the host is running in recovery mode
    fn is_recovery_mode(&self) -> bool;

    /// Seal state of the barrier itself, independent of host bookkeeping.
    fn barrier_sealed(&self) -> Result<bool, SealError>;
}

/// Threshold configuration as stored by the sealing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumConfig {
    /// Number of distinct shares needed to reconstruct the root secret
    pub secret_threshold: usize,
    /// Total number of shares issued
    pub secret_shares: usize,
}

impl QuorumConfig {
    /// Create a configuration for `threshold`-of-`shares`
    pub fn new(secret_threshold: usize, secret_shares: usize) -> Self {
        Self {
            secret_threshold,
            secret_shares,
        }
    }
}

/// Inclusive key length bounds reported by the barrier, before share overhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLengthBounds {
    /// Minimum key length in bytes
    pub min: usize,
    /// Maximum key length in bytes
    pub max: usize,
}

impl KeyLengthBounds {
    /// Create bounds
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Whether `len` falls within `[min, max]`.
    pub fn contains(&self, len: usize) -> bool {
        len >= self.min && len <= self.max
    }

    /// Bounds with `overhead` added to the maximum.
    pub fn with_overhead(self, overhead: usize) -> Self {
        Self {
            min: self.min,
            max: self.max.saturating_add(overhead),
        }
    }
}

/// Access to the sealing service's stored configuration.
pub trait SealAccess: Send + Sync {
    /// Active threshold configuration. Recovery configuration is returned
    /// instead of the barrier configuration when the seal supports recovery
    /// keys. `None` means the host is not initialized.
    fn current_config(&self) -> Result<Option<QuorumConfig>, SealError>;

    /// Key length bounds of the barrier
    fn key_length_bounds(&self) -> KeyLengthBounds;

    /// Extra bytes a share carries on top of the key it encodes.
    fn share_overhead(&self) -> usize;
}

/// Threshold secret reconstruction.
pub trait SecretReconstruction: Send + Sync {
    /// Combine at least `threshold` distinct shares into the shared secret.
    fn combine(&self, shares: &[KeyShare]) -> Result<RootSecret, SealError>;
}

/// Final verification of a reconstructed secret against the barrier.
pub trait RootVerifier: Send + Sync {
    /// Post-unseal transform from the combined key to the root key form the
    /// barrier can verify.
    fn derive_candidate_root(&self, secret: &RootSecret) -> Result<RootSecret, SealError>;

    /// Check a candidate root against the barrier's stored commitment.
    fn verify_root(&self, candidate: &RootSecret) -> Result<(), SealError>;
}

/// Everything the quorum verification coordinator needs from its host.
pub trait QuorumVerifyEffects:
    HostStatus + SealAccess + SecretReconstruction + RootVerifier
{
}

impl<T> QuorumVerifyEffects for T where
    T: HostStatus + SealAccess + SecretReconstruction + RootVerifier
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_with_overhead() {
        let bounds = KeyLengthBounds::new(16, 32).with_overhead(1);
        assert_eq!(bounds, KeyLengthBounds::new(16, 33));
        assert!(bounds.contains(16));
        assert!(bounds.contains(33));
        assert!(!bounds.contains(15));
        assert!(!bounds.contains(34));
    }

    #[test]
    fn test_overhead_saturates() {
        let bounds = KeyLengthBounds::new(0, usize::MAX).with_overhead(1);
        assert_eq!(bounds.max, usize::MAX);
    }
}

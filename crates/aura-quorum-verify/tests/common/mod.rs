//! Test utilities for quorum verification
//!
//! In-memory host whose secret sharing is n-of-n XOR, enough to exercise the
//! coordinator end to end without a real combiner.

#![allow(dead_code)]

use aura_quorum_verify::{
    HostStatus, KeyLengthBounds, KeyShare, QuorumConfig, QuorumVerifier, RootSecret,
    RootVerifier, SealAccess, SealError, SecretReconstruction,
};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const KEY_MIN: usize = 16;
pub const KEY_MAX: usize = 32;
pub const SHARE_OVERHEAD: usize = 1;

/// Root key every mock host verifies against.
pub fn root_key() -> Vec<u8> {
    (0u8..32).map(|i| i.wrapping_mul(7).wrapping_add(3)).collect()
}

/// Split `secret` into `count` XOR shares. `seed` varies the random-looking
/// shares so separate calls produce disjoint sets.
pub fn xor_split(secret: &[u8], count: usize, seed: u8) -> Vec<Vec<u8>> {
    assert!(count > 0, "at least one share");
    let mut shares: Vec<Vec<u8>> = (0..count - 1)
        .map(|i| {
            secret
                .iter()
                .enumerate()
                .map(|(j, _)| {
                    seed.wrapping_mul(13)
                        .wrapping_add((i as u8).wrapping_mul(31))
                        .wrapping_add((j as u8).wrapping_mul(17))
                        .wrapping_add(1)
                })
                .collect()
        })
        .collect();

    let mut last = secret.to_vec();
    for share in &shares {
        for (byte, mask) in last.iter_mut().zip(share) {
            *byte ^= mask;
        }
    }
    shares.push(last);
    shares
}

/// Shares that reconstruct [`root_key`] under `threshold`-of-`threshold` XOR.
pub fn valid_shares(threshold: usize) -> Vec<Vec<u8>> {
    xor_split(&root_key(), threshold, 1)
}

#[derive(Debug)]
pub struct MockHost {
    state_lock: RwLock<()>,
    sealed: AtomicBool,
    standby: AtomicBool,
    recovery_mode: AtomicBool,
    barrier_sealed: AtomicBool,
    barrier_error: AtomicBool,
    config: Mutex<Option<QuorumConfig>>,
    config_error: AtomicBool,
    root: Vec<u8>,
    combine_calls: AtomicUsize,
    derive_calls: AtomicUsize,
    fail_derive: AtomicBool,
}

impl MockHost {
    /// Unsealed active node with a `threshold`-of-`threshold` seal.
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            state_lock: RwLock::new(()),
            sealed: AtomicBool::new(false),
            standby: AtomicBool::new(false),
            recovery_mode: AtomicBool::new(false),
            barrier_sealed: AtomicBool::new(false),
            barrier_error: AtomicBool::new(false),
            config: Mutex::new(Some(QuorumConfig::new(threshold, threshold))),
            config_error: AtomicBool::new(false),
            root: root_key(),
            combine_calls: AtomicUsize::new(0),
            derive_calls: AtomicUsize::new(0),
            fail_derive: AtomicBool::new(false),
        }
    }

    /// Host with no seal configuration.
    pub fn uninitialized() -> Self {
        let host = Self::with_threshold(1);
        *host.config.lock() = None;
        host
    }

    /// Seal or unseal the host, taking the state lock exclusively as a real
    /// seal transition would.
    pub fn set_sealed(&self, sealed: bool) {
        let _state = self.state_lock.write();
        self.store_sealed(sealed);
    }

    /// Flip the sealed flags without locking, for callers already holding
    /// the state lock exclusively.
    pub fn store_sealed(&self, sealed: bool) {
        self.sealed.store(sealed, Ordering::SeqCst);
        self.barrier_sealed.store(sealed, Ordering::SeqCst);
    }

    pub fn set_standby(&self, standby: bool) {
        let _state = self.state_lock.write();
        self.standby.store(standby, Ordering::SeqCst);
    }

    pub fn set_recovery_mode(&self, recovery_mode: bool) {
        let _state = self.state_lock.write();
        self.recovery_mode.store(recovery_mode, Ordering::SeqCst);
    }

    pub fn set_barrier_sealed(&self, sealed: bool) {
        self.barrier_sealed.store(sealed, Ordering::SeqCst);
    }

    pub fn fail_barrier_check(&self) {
        self.barrier_error.store(true, Ordering::SeqCst);
    }

    pub fn fail_config_read(&self) {
        self.config_error.store(true, Ordering::SeqCst);
    }

    pub fn fail_derive(&self) {
        self.fail_derive.store(true, Ordering::SeqCst);
    }

    pub fn set_threshold(&self, threshold: usize) {
        *self.config.lock() = Some(QuorumConfig::new(threshold, threshold));
    }

    pub fn combine_calls(&self) -> usize {
        self.combine_calls.load(Ordering::SeqCst)
    }

    pub fn derive_calls(&self) -> usize {
        self.derive_calls.load(Ordering::SeqCst)
    }
}

impl HostStatus for MockHost {
    fn state_lock(&self) -> &RwLock<()> {
        &self.state_lock
    }

    fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    fn is_standby(&self) -> bool {
        self.standby.load(Ordering::SeqCst)
    }

    fn is_recovery_mode(&self) -> bool {
        self.recovery_mode.load(Ordering::SeqCst)
    }

    fn barrier_sealed(&self) -> Result<bool, SealError> {
        if self.barrier_error.load(Ordering::SeqCst) {
            return Err(SealError::new("barrier unreachable"));
        }
        Ok(self.barrier_sealed.load(Ordering::SeqCst))
    }
}

impl SealAccess for MockHost {
    fn current_config(&self) -> Result<Option<QuorumConfig>, SealError> {
        if self.config_error.load(Ordering::SeqCst) {
            return Err(SealError::new("seal storage unavailable"));
        }
        Ok(*self.config.lock())
    }

    fn key_length_bounds(&self) -> KeyLengthBounds {
        KeyLengthBounds::new(KEY_MIN, KEY_MAX)
    }

    fn share_overhead(&self) -> usize {
        SHARE_OVERHEAD
    }
}

impl SecretReconstruction for MockHost {
    fn combine(&self, shares: &[KeyShare]) -> Result<RootSecret, SealError> {
        self.combine_calls.fetch_add(1, Ordering::SeqCst);

        let first = shares
            .first()
            .ok_or_else(|| SealError::new("no shares to combine"))?;
        if shares.iter().any(|share| share.len() != first.len()) {
            return Err(SealError::new("share lengths differ"));
        }

        let mut combined = vec![0u8; first.len()];
        for share in shares {
            for (byte, part) in combined.iter_mut().zip(share.expose()) {
                *byte ^= part;
            }
        }
        Ok(RootSecret::new(combined))
    }
}

impl RootVerifier for MockHost {
    fn derive_candidate_root(&self, secret: &RootSecret) -> Result<RootSecret, SealError> {
        self.derive_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_derive.load(Ordering::SeqCst) {
            return Err(SealError::new("keyring decryption failed"));
        }
        Ok(RootSecret::new(secret.expose().to_vec()))
    }

    fn verify_root(&self, candidate: &RootSecret) -> Result<(), SealError> {
        if candidate.expose() == self.root.as_slice() {
            Ok(())
        } else {
            Err(SealError::new("root key does not match"))
        }
    }
}

/// Coordinator over a fresh mock host.
pub fn verifier(threshold: usize) -> (Arc<MockHost>, QuorumVerifier<MockHost>) {
    let host = Arc::new(MockHost::with_threshold(threshold));
    let verifier = QuorumVerifier::new(Arc::clone(&host));
    (host, verifier)
}

pub fn share(bytes: &[u8]) -> KeyShare {
    KeyShare::from_slice(bytes)
}

/// Route coordinator logs to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

//! Quorum verification coordinator
//!
//! Drives the single verification session through its lifecycle:
//!
//! ```text
//! Idle --start--> Active(nonce, [])
//! Active --submit, progress < threshold--> Active(nonce, shares)
//! Active --submit, progress == threshold--> Idle   (verified or failed)
//! Active --cancel--> Idle
//! ```
//!
//! Every operation takes the host state lock (shared) and then the session
//! lock, in that order, and checks seal/standby state before touching the
//! session. The finalizing submit runs reconstruction and root verification
//! while still holding the session lock, so no other request can observe a
//! half-consumed session.
//!
//! A failed reconstruction or verification resets the coordinator to Idle.
//! The accumulated shares are scrubbed and the nonce is retired; operators
//! start a new session to try again.

use crate::config::VerifyConfig;
use crate::effects::{KeyLengthBounds, QuorumConfig, QuorumVerifyEffects};
use crate::errors::{LengthBound, VerifyError, VerifyResult};
use crate::secret::{KeyShare, RootSecret};
use crate::session::{self, SessionNonce, SessionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Returned by [`QuorumVerifier::start`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Nonce every share of this session must carry
    pub nonce: SessionNonce,
}

/// Snapshot returned by [`QuorumVerifier::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyProgress {
    /// Nonce of the active session, if any
    pub nonce: Option<SessionNonce>,
    /// Whether a session is active
    pub started: bool,
    /// Shares accepted so far
    pub progress: usize,
    /// Shares required by the current seal configuration. Zero when the host
    /// has no configuration yet.
    pub required: usize,
}

/// Outcome of an accepted share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyQuorumResult {
    /// Shares accepted so far
    pub progress: usize,
    /// Shares required by the seal configuration
    pub required: usize,
}

impl VerifyQuorumResult {
    /// True once the quorum was reached and the root key verified.
    pub fn is_complete(&self) -> bool {
        self.progress >= self.required
    }
}

/// Coordinates dry-run quorum verification against the host's barrier.
pub struct QuorumVerifier<E: QuorumVerifyEffects> {
    effects: Arc<E>,
    sessions: SessionStore,
    config: VerifyConfig,
}

impl<E: QuorumVerifyEffects> QuorumVerifier<E> {
    /// Create a coordinator with default configuration.
    pub fn new(effects: Arc<E>) -> Self {
        Self::with_config(effects, VerifyConfig::default())
    }

    /// Create a coordinator with explicit configuration.
    pub fn with_config(effects: Arc<E>, config: VerifyConfig) -> Self {
        Self {
            effects,
            sessions: SessionStore::new(),
            config,
        }
    }

    /// Host collaborators
    pub fn effects(&self) -> &Arc<E> {
        &self.effects
    }

    /// Active configuration
    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Begin a verification session.
    pub fn start(&self) -> VerifyResult<SessionInfo> {
        self.ensure_enabled()?;

        let _state = self.effects.state_lock().read();
        self.ensure_sealed_state()?;
        self.ensure_barrier_sealed_for_recovery()?;
        self.ensure_active_node()?;

        let mut slot = self.sessions.lock();
        let nonce = session::open(&mut slot)?;

        tracing::info!(nonce = %self.loggable(&nonce), "verify initialized");
        Ok(SessionInfo { nonce })
    }

    /// Report the current session without modifying it.
    pub fn status(&self) -> VerifyResult<VerifyProgress> {
        self.ensure_enabled()?;

        let _state = self.effects.state_lock().read();
        self.ensure_sealed_state()?;
        self.ensure_active_node()?;

        let required = self
            .read_quorum_config()?
            .map_or(0, |config| config.secret_threshold);

        let slot = self.sessions.lock();
        let (nonce, progress) = match slot.as_ref() {
            Some(active) => (Some(active.nonce().clone()), active.progress()),
            None => (None, 0),
        };

        Ok(VerifyProgress {
            started: nonce.is_some(),
            nonce,
            progress,
            required,
        })
    }

    /// Submit one key share for the session identified by `nonce`.
    ///
    /// Returns the new progress. When progress reaches the threshold the
    /// shares are combined and verified before this call returns, and the
    /// session ends whether or not verification succeeds.
    pub fn submit(&self, share: KeyShare, nonce: &str) -> VerifyResult<VerifyQuorumResult> {
        self.ensure_enabled()?;

        let bounds = self
            .effects
            .key_length_bounds()
            .with_overhead(self.effects.share_overhead());
        check_share_length(&share, bounds)?;

        let required = match self.read_quorum_config()? {
            Some(config) => threshold_of(config)?,
            None => return Err(VerifyError::NotInitialized),
        };

        let _state = self.effects.state_lock().read();
        self.ensure_sealed_state()?;
        self.ensure_barrier_sealed_for_recovery()?;
        self.ensure_active_node()?;

        let mut slot = self.sessions.lock();
        let progress = {
            let active = slot
                .as_mut()
                .ok_or(VerifyError::NoVerificationInProgress)?;
            active.accept(nonce, share).map_err(|err| {
                tracing::warn!(reason = rejection_reason(&err), "verify share rejected");
                err
            })?
        };

        if progress < required {
            tracing::debug!(
                keys = progress,
                threshold = required,
                "cannot verify, not enough keys"
            );
            return Ok(VerifyQuorumResult { progress, required });
        }

        // Commit point: the session leaves the slot before any combination is
        // attempted, so a failure below cannot leave partial state behind.
        let Some(finished) = slot.take() else {
            return Err(VerifyError::NoVerificationInProgress);
        };
        let (session_nonce, shares) = finished.into_parts();

        match self.verify_shares(shares, required) {
            Ok(()) => {
                tracing::info!(nonce = %self.loggable(&session_nonce), "verify finished");
                Ok(VerifyQuorumResult { progress, required })
            }
            Err(err) => {
                tracing::error!(
                    nonce = %self.loggable(&session_nonce),
                    error = %err,
                    "verify quorum aborted"
                );
                Err(err)
            }
        }
    }

    /// Discard any active session. Succeeds when none is active.
    pub fn cancel(&self) -> VerifyResult<()> {
        self.ensure_enabled()?;

        let _state = self.effects.state_lock().read();
        self.ensure_sealed_state()?;
        self.ensure_active_node()?;

        let mut slot = self.sessions.lock();
        if let Some(nonce) = session::clear(&mut slot) {
            tracing::info!(nonce = %self.loggable(&nonce), "verify canceled");
        }
        Ok(())
    }

    /// Combine the shares, derive the root key, and check it against the
    /// barrier. Shares, combined secret and root are scrubbed on every path.
    fn verify_shares(&self, shares: Vec<KeyShare>, required: usize) -> VerifyResult<()> {
        let combined = if required == 1 {
            shares
                .into_iter()
                .next()
                .map(KeyShare::into_secret)
                .ok_or_else(|| VerifyError::reconstruction("no key shares to combine"))?
        } else {
            let combined = self
                .effects
                .combine(&shares)
                .map_err(|e| VerifyError::reconstruction(e.message()));
            drop(shares);
            combined?
        };

        let root: RootSecret = {
            let derived = self
                .effects
                .derive_candidate_root(&combined)
                .map_err(|e| VerifyError::authentication(e.message()));
            drop(combined);
            derived?
        };

        self.effects
            .verify_root(&root)
            .map_err(|e| VerifyError::verification(e.message()))
    }

    fn ensure_enabled(&self) -> VerifyResult<()> {
        if self.config.enabled {
            Ok(())
        } else {
            Err(VerifyError::Disabled)
        }
    }

    fn ensure_sealed_state(&self) -> VerifyResult<()> {
        if self.effects.is_sealed() && !self.effects.is_recovery_mode() {
            return Err(VerifyError::HostSealed);
        }
        Ok(())
    }

    fn ensure_active_node(&self) -> VerifyResult<()> {
        if self.effects.is_standby() && !self.effects.is_recovery_mode() {
            return Err(VerifyError::HostStandby);
        }
        Ok(())
    }

    /// In recovery mode the barrier must still be sealed; verifying against
    /// an unsealed barrier is meaningless there.
    fn ensure_barrier_sealed_for_recovery(&self) -> VerifyResult<()> {
        let barrier_sealed = self
            .effects
            .barrier_sealed()
            .map_err(|e| VerifyError::barrier_status(e.message()))?;
        if !barrier_sealed && self.effects.is_recovery_mode() {
            return Err(VerifyError::AlreadyUnsealed);
        }
        Ok(())
    }

    fn read_quorum_config(&self) -> VerifyResult<Option<QuorumConfig>> {
        self.effects
            .current_config()
            .map_err(|e| VerifyError::seal_access(e.message()))
    }

    fn loggable<'a>(&self, nonce: &'a SessionNonce) -> &'a str {
        if self.config.log_nonce {
            nonce.as_str()
        } else {
            "<redacted>"
        }
    }
}

fn check_share_length(share: &KeyShare, bounds: KeyLengthBounds) -> VerifyResult<()> {
    let actual = share.len();
    if actual < bounds.min {
        return Err(VerifyError::InvalidKeyLength {
            bound: LengthBound::Minimum,
            limit: bounds.min,
            actual,
        });
    }
    if actual > bounds.max {
        return Err(VerifyError::InvalidKeyLength {
            bound: LengthBound::Maximum,
            limit: bounds.max,
            actual,
        });
    }
    Ok(())
}

fn rejection_reason(err: &VerifyError) -> &'static str {
    match err {
        VerifyError::NonceMismatch { .. } => "nonce mismatch",
        VerifyError::DuplicateShare => "duplicate share",
        _ => "invalid share",
    }
}

fn threshold_of(config: QuorumConfig) -> VerifyResult<usize> {
    if config.secret_threshold == 0 {
        return Err(VerifyError::seal_access(
            "seal configuration has a zero secret threshold",
        ));
    }
    if config.secret_threshold > config.secret_shares {
        return Err(VerifyError::seal_access(format!(
            "seal configuration threshold {} exceeds issued shares {}",
            config.secret_threshold, config.secret_shares
        )));
    }
    Ok(config.secret_threshold)
}

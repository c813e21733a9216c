//! Error taxonomy for quorum verification
//!
//! Every failure is terminal for the request that produced it. Nothing in this
//! crate retries; callers decide whether to resubmit, restart or give up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which bound a rejected share violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthBound {
    /// The share is shorter than the minimum key length.
    Minimum,
    /// The share is longer than the maximum key length plus share overhead.
    Maximum,
}

impl fmt::Display for LengthBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthBound::Minimum => f.write_str("shorter than minimum"),
            LengthBound::Maximum => f.write_str("longer than maximum"),
        }
    }
}

/// Coarse grouping of [`VerifyError`] variants for transports that need to
/// pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Host is not in a state that allows verification; retry later or elsewhere.
    Precondition,
    /// Request conflicts with the current session state.
    Conflict,
    /// Caller supplied bad input. Session state is unchanged.
    Input,
    /// The combined shares did not yield a valid root key.
    Verification,
    /// A collaborator failed in a way the caller cannot fix.
    Internal,
}

/// Errors returned by the quorum verification coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VerifyError {
    /// Host is sealed and not running in recovery mode
    #[error("host is sealed")]
    HostSealed,

    /// Host is a standby replica and not running in recovery mode
    #[error("host is in standby mode")]
    HostStandby,

    /// Sealing service has no configuration yet
    #[error("host is not yet initialized")]
    NotInitialized,

    /// Recovery mode was requested but the barrier is already unsealed
    #[error("attempt to verify when already unsealed")]
    AlreadyUnsealed,

    /// Barrier seal state could not be determined
    #[error("unable to check barrier seal status: {message}")]
    BarrierStatusUnavailable {
        /// Reason reported by the barrier
        message: String,
    },

    /// Sealing service failed to return its configuration
    #[error("unable to read seal configuration: {message}")]
    SealAccess {
        /// Reason reported by the sealing service
        message: String,
    },

    /// Verification configuration could not be loaded or is invalid
    #[error("invalid verify configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration
        message: String,
    },

    /// Quorum verification is turned off
    #[error("quorum verification is disabled")]
    Disabled,

    /// A verification session already exists
    #[error("verify already in progress")]
    AlreadyInProgress,

    /// `submit` was called with no active session
    #[error("no verification in progress")]
    NoVerificationInProgress,

    /// Supplied nonce does not belong to the active session
    #[error("incorrect nonce supplied; nonce for this verify operation is {expected:?}")]
    NonceMismatch {
        /// Nonce of the active session. Nonces are not secret.
        expected: String,
    },

    /// The share was already accepted in this session
    #[error("given key has already been provided during this verify operation")]
    DuplicateShare,

    /// Share length is outside the accepted bounds
    #[error("key is {bound} {limit} bytes")]
    InvalidKeyLength {
        /// Violated bound
        bound: LengthBound,
        /// Value of the violated bound in bytes
        limit: usize,
        /// Length of the rejected share
        actual: usize,
    },

    /// Transport-encoded key was neither hex nor base64
    #[error("'key' must be a valid hex or base64 string")]
    InvalidKeyEncoding,

    /// Secret sharing combination failed
    #[error("failed to compute root key: {message}")]
    ReconstructionFailed {
        /// Reason reported by the combiner
        message: String,
    },

    /// Candidate root could not be derived from the combined secret
    #[error("unable to authenticate: {message}")]
    AuthenticationFailed {
        /// Reason reported by the sealing service
        message: String,
    },

    /// Derived root did not match the stored commitment
    #[error("root key verification failed: {message}")]
    VerificationFailed {
        /// Reason reported by the barrier
        message: String,
    },
}

impl VerifyError {
    /// Create a barrier status error
    pub fn barrier_status(message: impl Into<String>) -> Self {
        Self::BarrierStatusUnavailable {
            message: message.into(),
        }
    }

    /// Create a seal configuration access error
    pub fn seal_access(message: impl Into<String>) -> Self {
        Self::SealAccess {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a reconstruction error
    pub fn reconstruction(message: impl Into<String>) -> Self {
        Self::ReconstructionFailed {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Create a root verification error
    pub fn verification(message: impl Into<String>) -> Self {
        Self::VerificationFailed {
            message: message.into(),
        }
    }

    /// Category used by transports to pick a response status.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HostSealed
            | Self::HostStandby
            | Self::NotInitialized
            | Self::AlreadyUnsealed
            | Self::Disabled => ErrorCategory::Precondition,
            Self::AlreadyInProgress => ErrorCategory::Conflict,
            Self::NoVerificationInProgress
            | Self::NonceMismatch { .. }
            | Self::DuplicateShare
            | Self::InvalidKeyLength { .. }
            | Self::InvalidKeyEncoding => ErrorCategory::Input,
            Self::ReconstructionFailed { .. }
            | Self::AuthenticationFailed { .. }
            | Self::VerificationFailed { .. } => ErrorCategory::Verification,
            Self::BarrierStatusUnavailable { .. }
            | Self::SealAccess { .. }
            | Self::InvalidConfig { .. } => ErrorCategory::Internal,
        }
    }

    /// Whether the session was discarded as a side effect of this error.
    pub fn ends_session(&self) -> bool {
        self.category() == ErrorCategory::Verification
    }
}

/// Result alias for quorum verification operations
pub type VerifyResult<T> = std::result::Result<T, VerifyError>;

/// Failure reported by an external collaborator (sealing service, barrier,
/// combiner).
///
/// Collaborators never see [`VerifyError`]; the coordinator decides which
/// variant a collaborator failure maps to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SealError {
    message: String,
}

impl SealError {
    /// Create a collaborator error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Reported reason
    pub fn message(&self) -> &str {
        &self.message
    }
}

//! # Aura Quorum Verify
//!
//! Dry-run verification of a quorum of unseal or recovery key shares.
//!
//! Operators submit shares one at a time into a nonce-bound session. Once the
//! seal's threshold is reached the shares are combined, the candidate root key
//! is derived and checked against the barrier, and the session ends. Nothing
//! here unseals the host or changes its seal state.
//!
//! ## Components
//!
//! - **Session store** ([`session`]): the single active session and its mutex
//! - **Coordinator** ([`coordinator`]): `start`, `status`, `submit`, `cancel`
//! - **Effects** ([`effects`]): host status, seal configuration, secret
//!   combination and root verification, all supplied by the host
//! - **API** ([`api`]): transport-neutral request/response shapes
//!
//! ## Lock ordering
//!
//! Host state lock (shared) first, session lock second, on every operation.
//! See [`effects`] for the contract hosts must honor.

#![forbid(unsafe_code)]

/// Transport-neutral request/response types
pub mod api;

/// Coordinator configuration
pub mod config;

/// Quorum verification coordinator
pub mod coordinator;

/// Host collaborator traits
pub mod effects;

/// Error taxonomy
pub mod errors;

/// Zeroizing share and secret wrappers
pub mod secret;

/// Single-slot session store
pub mod session;

pub use api::{decode_key, VerifyQuorumApi, VerifyQuorumStatusResponse, VerifyQuorumUpdateRequest};
pub use config::{KeyEncoding, VerifyConfig};
pub use coordinator::{QuorumVerifier, SessionInfo, VerifyProgress, VerifyQuorumResult};
pub use effects::{
    HostStatus, KeyLengthBounds, QuorumConfig, QuorumVerifyEffects, RootVerifier, SealAccess,
    SecretReconstruction,
};
pub use errors::{ErrorCategory, LengthBound, SealError, VerifyError, VerifyResult};
pub use secret::{KeyShare, RootSecret};
pub use session::SessionNonce;

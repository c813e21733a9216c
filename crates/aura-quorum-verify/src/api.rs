//! Transport-facing request and response shapes
//!
//! HTTP, CLI and RPC layers marshal into these types and call
//! [`VerifyQuorumApi`]. No decision logic lives here beyond key decoding and
//! assembling the status body.

use crate::config::KeyEncoding;
use crate::coordinator::{QuorumVerifier, VerifyProgress};
use crate::effects::{KeyLengthBounds, QuorumVerifyEffects};
use crate::errors::{VerifyError, VerifyResult};
use crate::secret::KeyShare;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::{Zeroize, Zeroizing};

/// Status body returned by every verification endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyQuorumStatusResponse {
    /// Nonce of the active session, empty when idle
    pub nonce: String,
    /// Whether a session is active
    pub started: bool,
    /// Shares accepted so far
    pub progress: usize,
    /// Shares required
    pub required: usize,
    /// Whether the last submitted share completed a successful verification
    pub complete: bool,
}

impl From<VerifyProgress> for VerifyQuorumStatusResponse {
    fn from(status: VerifyProgress) -> Self {
        Self {
            nonce: status.nonce.map(|n| n.to_string()).unwrap_or_default(),
            started: status.started,
            progress: status.progress,
            required: status.required,
            complete: false,
        }
    }
}

/// Body of an update request. The encoded key is scrubbed on drop.
#[derive(Default, Serialize, Deserialize)]
pub struct VerifyQuorumUpdateRequest {
    /// Key share, hex or base64 encoded
    pub key: String,
    /// Nonce returned when the session was started
    pub nonce: String,
}

impl std::fmt::Debug for VerifyQuorumUpdateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyQuorumUpdateRequest")
            .field("key", &"<redacted>")
            .field("nonce", &self.nonce)
            .finish()
    }
}

impl Drop for VerifyQuorumUpdateRequest {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Decode a transport key share.
///
/// Encodings are tried in order. A hex decode only counts when its length
/// also falls within `bounds`, so a base64 string that happens to be valid
/// hex still decodes as base64. `bounds` must already include any share
/// overhead. The text is taken as-is; surrounding whitespace is invalid.
pub fn decode_key(
    text: &str,
    bounds: KeyLengthBounds,
    encodings: &[KeyEncoding],
) -> VerifyResult<KeyShare> {
    if text.is_empty() {
        return Err(VerifyError::InvalidKeyEncoding);
    }

    for encoding in encodings {
        let decoded = match encoding {
            KeyEncoding::Hex => hex::decode(text)
                .ok()
                .map(Zeroizing::new)
                .filter(|bytes| bounds.contains(bytes.len())),
            KeyEncoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(text)
                .ok()
                .map(Zeroizing::new),
        };
        if let Some(mut bytes) = decoded {
            return Ok(KeyShare::new(std::mem::take(&mut *bytes)));
        }
    }

    Err(VerifyError::InvalidKeyEncoding)
}

/// Endpoint handlers over a shared coordinator.
pub struct VerifyQuorumApi<E: QuorumVerifyEffects> {
    verifier: Arc<QuorumVerifier<E>>,
}

impl<E: QuorumVerifyEffects> Clone for VerifyQuorumApi<E> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
        }
    }
}

impl<E: QuorumVerifyEffects> VerifyQuorumApi<E> {
    /// Wrap a coordinator
    pub fn new(verifier: Arc<QuorumVerifier<E>>) -> Self {
        Self { verifier }
    }

    /// Underlying coordinator
    pub fn verifier(&self) -> &Arc<QuorumVerifier<E>> {
        &self.verifier
    }

    /// Read the current status.
    pub fn init_get(&self) -> VerifyResult<VerifyQuorumStatusResponse> {
        let status = self.verifier.status()?;
        if status.required == 0 {
            return Err(VerifyError::NotInitialized);
        }
        Ok(status.into())
    }

    /// Start a session and return the resulting status.
    pub fn init_put(&self) -> VerifyResult<VerifyQuorumStatusResponse> {
        self.verifier.start()?;
        self.init_get()
    }

    /// Cancel any session.
    pub fn init_delete(&self) -> VerifyResult<()> {
        self.verifier.cancel()
    }

    /// Decode and submit one key share.
    pub fn update(
        &self,
        request: &VerifyQuorumUpdateRequest,
    ) -> VerifyResult<VerifyQuorumStatusResponse> {
        let effects = self.verifier.effects();
        let bounds = effects
            .key_length_bounds()
            .with_overhead(effects.share_overhead());
        let share = decode_key(&request.key, bounds, &self.verifier.config().key_encodings)?;
        let result = self.verifier.submit(share, &request.nonce)?;

        Ok(VerifyQuorumStatusResponse {
            nonce: request.nonce.clone(),
            started: true,
            progress: result.progress,
            required: result.required,
            complete: result.is_complete(),
        })
    }
}

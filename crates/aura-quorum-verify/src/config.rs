//! Quorum verification configuration

use crate::errors::{VerifyError, VerifyResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Text encodings accepted for transport-supplied key shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    /// Lowercase or uppercase hexadecimal
    Hex,
    /// Standard base64 with padding
    Base64,
}

/// Configuration for the quorum verification coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Serve verification requests. When false every operation fails with
    /// [`VerifyError::Disabled`].
    pub enabled: bool,

    /// Encodings tried, in order, when decoding a transport key.
    pub key_encodings: Vec<KeyEncoding>,

    /// Include the session nonce in log events.
    pub log_nonce: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_encodings: vec![KeyEncoding::Hex, KeyEncoding::Base64],
            log_nonce: true,
        }
    }
}

impl VerifyConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> VerifyResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| VerifyError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load_from_file(path: &Path) -> VerifyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VerifyError::invalid_config(format!(
                "Failed to read verify config {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> VerifyResult<()> {
        if self.key_encodings.is_empty() {
            return Err(VerifyError::invalid_config(
                "verify config must accept at least one key encoding",
            ));
        }
        Ok(())
    }
}

//! Crypto core configuration.

use pgpmail_openpgp::{Cipher, KeyAlgorithm};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Smallest accepted token length in bytes.
pub const MIN_TOKEN_BYTES: usize = 16;

/// Configuration shared by the user and address facades.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Symmetric algorithm for freshly generated session keys.
    pub cipher: Cipher,

    /// Algorithm for generated address keys.
    pub key_algorithm: KeyAlgorithm,

    /// Random bytes in ephemeral and address-key tokens.
    pub ephemeral_token_bytes: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            cipher: Cipher::Aes256,
            key_algorithm: KeyAlgorithm::Curve25519,
            ephemeral_token_bytes: 32, // 256-bit tokens
        }
    }
}

impl CryptoConfig {
    pub fn validate(&self) -> CryptoResult<()> {
        if self.ephemeral_token_bytes < MIN_TOKEN_BYTES {
            return Err(CryptoError::Config(format!(
                "ephemeral_token_bytes must be at least {MIN_TOKEN_BYTES}, got {}",
                self.ephemeral_token_bytes
            )));
        }
        Ok(())
    }
}

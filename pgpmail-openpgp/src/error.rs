//! Engine error types.

use thiserror::Error;

/// Result type for OpenPGP engine operations.
pub type PgpResult<T> = Result<T, PgpError>;

/// Errors that can occur inside the OpenPGP engine.
///
/// Messages carry engine diagnostics only. Passphrases, session keys and
/// plaintext never end up in an error string.
#[derive(Debug, Error)]
pub enum PgpError {
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("armor error: {0}")]
    Armor(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("signature verification could not run: {0}")]
    Verification(String),

    #[error("key {0} has no usable encryption subkey")]
    NoEncryptionKey(String),

    #[error("key {0} has no usable signing subkey")]
    NoSigningKey(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

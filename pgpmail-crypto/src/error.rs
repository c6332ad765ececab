//! Crypto core error types.

use thiserror::Error;

use crate::types::KeyScope;

/// Result type for crypto core operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors surfaced by the crypto facades.
///
/// Per-key failures during a multi-key trial never show up here; only the
/// aggregate outcome does. No variant carries passphrases, tokens, session
/// keys or plaintext.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("no valid decryption key after trying {tried} key(s) for {scope}")]
    NoValidDecryptionKey { tried: usize, scope: KeyScope },

    #[error("no keys available for address {0}")]
    KeysUnavailable(String),

    #[error("no keys available")]
    NoKeysAvailable,

    #[error("primary key could not be unlocked for signing")]
    SigningKeyLocked,

    #[error("at least one recipient key is required")]
    NoRecipients,

    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("key token error: {0}")]
    Token(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("OpenPGP error: {0}")]
    Pgp(#[from] pgpmail_openpgp::PgpError),
}

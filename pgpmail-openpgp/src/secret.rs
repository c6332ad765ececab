//! Secret values handled by the engine: passphrases and session keys.
//!
//! Both types wipe their bytes when dropped. Neither prints its content
//! through `Debug`.

use std::fmt;
use std::str::FromStr;

use sequoia_openpgp as openpgp;
use openpgp::crypto::Password;
use openpgp::types::SymmetricAlgorithm;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{PgpError, PgpResult};

/// Passphrase that unlocks a private key.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct Passphrase {
    bytes: Vec<u8>,
}

impl Passphrase {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Converts to the engine's password type, which keeps the bytes
    /// encrypted in memory while it is alive.
    pub(crate) fn to_password(&self) -> Password {
        Password::from(self.bytes.clone())
    }
}

impl From<&str> for Passphrase {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for Passphrase {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

/// Symmetric cipher used for session keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cipher {
    Aes128,
    Aes192,
    Aes256,
}

impl Cipher {
    pub fn name(self) -> &'static str {
        match self {
            Cipher::Aes128 => "aes128",
            Cipher::Aes192 => "aes192",
            Cipher::Aes256 => "aes256",
        }
    }

    /// Session key length in bytes.
    pub fn key_size(self) -> usize {
        match self {
            Cipher::Aes128 => 16,
            Cipher::Aes192 => 24,
            Cipher::Aes256 => 32,
        }
    }

    pub(crate) fn algorithm(self) -> SymmetricAlgorithm {
        match self {
            Cipher::Aes128 => SymmetricAlgorithm::AES128,
            Cipher::Aes192 => SymmetricAlgorithm::AES192,
            Cipher::Aes256 => SymmetricAlgorithm::AES256,
        }
    }

    pub(crate) fn from_algorithm(algo: SymmetricAlgorithm) -> PgpResult<Self> {
        match algo {
            SymmetricAlgorithm::AES128 => Ok(Cipher::Aes128),
            SymmetricAlgorithm::AES192 => Ok(Cipher::Aes192),
            SymmetricAlgorithm::AES256 => Ok(Cipher::Aes256),
            other => Err(PgpError::Decryption(format!(
                "unsupported session key algorithm {other}"
            ))),
        }
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cipher {
    type Err = PgpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes128" => Ok(Cipher::Aes128),
            "aes192" => Ok(Cipher::Aes192),
            "aes256" => Ok(Cipher::Aes256),
            other => Err(PgpError::Encryption(format!("unknown cipher {other:?}"))),
        }
    }
}

/// Symmetric session key of a hybrid-encrypted message.
pub struct SessionKey {
    cipher: Cipher,
    key: openpgp::crypto::SessionKey,
}

impl SessionKey {
    /// Generates a fresh random session key.
    pub fn generate(cipher: Cipher) -> Self {
        Self {
            cipher,
            key: openpgp::crypto::SessionKey::new(cipher.key_size()),
        }
    }

    /// Wraps session key bytes that were established elsewhere.
    pub fn from_bytes(bytes: &[u8], cipher: Cipher) -> PgpResult<Self> {
        if bytes.len() != cipher.key_size() {
            return Err(PgpError::Encryption(format!(
                "{cipher} session key must be {} bytes, got {}",
                cipher.key_size(),
                bytes.len()
            )));
        }
        Ok(Self {
            cipher,
            key: openpgp::crypto::SessionKey::from(bytes.to_vec()),
        })
    }

    pub(crate) fn from_parts(
        algo: SymmetricAlgorithm,
        key: openpgp::crypto::SessionKey,
    ) -> PgpResult<Self> {
        Ok(Self {
            cipher: Cipher::from_algorithm(algo)?,
            key,
        })
    }

    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub(crate) fn algorithm(&self) -> SymmetricAlgorithm {
        self.cipher.algorithm()
    }

    pub(crate) fn inner(&self) -> &openpgp::crypto::SessionKey {
        &self.key
    }
}

impl Clone for SessionKey {
    fn clone(&self) -> Self {
        Self {
            cipher: self.cipher,
            key: self.key.clone(),
        }
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.cipher == other.cipher && self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("cipher", &self.cipher)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passphrase_debug_is_redacted() {
        let passphrase = Passphrase::from("hunter2hunter2");
        assert_eq!(format!("{passphrase:?}"), "Passphrase(<redacted>)");
    }

    #[test]
    fn session_key_debug_is_redacted() {
        let key = SessionKey::generate(Cipher::Aes256);
        let shown = format!("{key:?}");
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains("Aes256"));
    }

    #[test]
    fn generated_session_key_has_cipher_length() {
        for cipher in [Cipher::Aes128, Cipher::Aes192, Cipher::Aes256] {
            assert_eq!(SessionKey::generate(cipher).as_bytes().len(), cipher.key_size());
        }
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        assert!(SessionKey::from_bytes(&[0u8; 16], Cipher::Aes256).is_err());
        assert!(SessionKey::from_bytes(&[0u8; 32], Cipher::Aes256).is_ok());
    }

    #[test]
    fn cipher_names_parse_back() {
        for cipher in [Cipher::Aes128, Cipher::Aes192, Cipher::Aes256] {
            assert_eq!(cipher.name().parse::<Cipher>().unwrap(), cipher);
        }
        assert!("blowfish".parse::<Cipher>().is_err());
    }
}

//! Facade over the keys of one address.

use chrono::{DateTime, Utc};
use pgpmail_openpgp::{decrypt_with_password, encrypt_with_password, KeyRing, Passphrase};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::ciphertext::Ciphertext;
use crate::config::CryptoConfig;
use crate::crypto::Crypto;
use crate::error::{CryptoError, CryptoResult};
use crate::mime::MimeDecryption;
use crate::resolver::KeyResolver;
use crate::types::{KeyScope, User};

/// Crypto on behalf of one address, decrypting with that address's keys.
#[derive(Debug)]
pub struct AddressCrypto {
    resolver: KeyResolver,
    config: CryptoConfig,
}

/// Random token for messages to recipients outside the system, plus the
/// token encrypted under the sender-chosen password.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EphemeralToken {
    token: String,
    encrypted: String,
}

impl EphemeralToken {
    /// Hex-encoded token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Armored password-encrypted token.
    pub fn encrypted(&self) -> &str {
        &self.encrypted
    }
}

impl std::fmt::Debug for EphemeralToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralToken")
            .field("token", &"<redacted>")
            .field("encrypted", &self.encrypted)
            .finish()
    }
}

impl AddressCrypto {
    pub fn new(
        user: User,
        mailbox_passphrase: Passphrase,
        address_id: impl Into<String>,
    ) -> CryptoResult<Self> {
        Self::with_config(user, mailbox_passphrase, address_id, CryptoConfig::default())
    }

    pub fn with_config(
        user: User,
        mailbox_passphrase: Passphrase,
        address_id: impl Into<String>,
        config: CryptoConfig,
    ) -> CryptoResult<Self> {
        config.validate()?;
        Ok(Self {
            resolver: KeyResolver::new(user, mailbox_passphrase, KeyScope::Address(address_id.into())),
            config,
        })
    }

    pub fn address_id(&self) -> &str {
        match self.resolver.scope() {
            KeyScope::Address(id) => id.as_str(),
            KeyScope::User => "",
        }
    }

    /// Decrypts a PGP/MIME message and splits off its top-level headers.
    pub fn decrypt_mime(
        &self,
        ciphertext: &Ciphertext,
        verifiers: &KeyRing,
        at: DateTime<Utc>,
    ) -> CryptoResult<MimeDecryption> {
        let result = self.decrypt_and_verify(ciphertext, verifiers, at)?;
        Ok(MimeDecryption::parse(result.data(), result.verification()))
    }

    /// Generates a random token and encrypts it under `password`.
    pub fn generate_ephemeral_token(&self, password: &Passphrase) -> CryptoResult<EphemeralToken> {
        let mut random = Zeroizing::new(vec![0u8; self.config.ephemeral_token_bytes]);
        rand::rng().fill_bytes(random.as_mut_slice());
        let token = hex::encode(random.as_slice());
        let encrypted = encrypt_with_password(token.as_bytes(), password, self.config.cipher)?;
        Ok(EphemeralToken { token, encrypted })
    }

    /// Recovers the token from its password-encrypted form.
    pub fn decrypt_ephemeral_token(
        &self,
        encrypted: &str,
        password: &Passphrase,
    ) -> CryptoResult<EphemeralToken> {
        let bytes = Zeroizing::new(decrypt_with_password(encrypted, password)?);
        let token = std::str::from_utf8(&bytes)
            .map_err(|_| CryptoError::InvalidUtf8)?
            .to_string();
        Ok(EphemeralToken {
            token,
            encrypted: encrypted.to_string(),
        })
    }
}

impl Crypto for AddressCrypto {
    fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    fn config(&self) -> &CryptoConfig {
        &self.config
    }
}

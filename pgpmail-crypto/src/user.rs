//! Facade over a user's account-level keys.

use pgpmail_openpgp::{encrypt_message, generate_key, sign_detached, Passphrase};
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroizing;

use crate::ciphertext::Ciphertext;
use crate::config::CryptoConfig;
use crate::crypto::Crypto;
use crate::error::CryptoResult;
use crate::resolver::KeyResolver;
use crate::types::{Key, KeyScope, User};

/// Crypto on behalf of a user, decrypting with the user keys.
#[derive(Debug)]
pub struct UserCrypto {
    resolver: KeyResolver,
    config: CryptoConfig,
}

/// A freshly generated address key and its public half.
#[derive(Clone, Debug)]
pub struct GeneratedAddressKey {
    /// Key record ready for the key store, carrying token and signature.
    pub key: Key,
    pub fingerprint: String,
    pub armored_public: String,
}

impl UserCrypto {
    pub fn new(user: User, mailbox_passphrase: Passphrase) -> CryptoResult<Self> {
        Self::with_config(user, mailbox_passphrase, CryptoConfig::default())
    }

    pub fn with_config(
        user: User,
        mailbox_passphrase: Passphrase,
        config: CryptoConfig,
    ) -> CryptoResult<Self> {
        config.validate()?;
        Ok(Self {
            resolver: KeyResolver::new(user, mailbox_passphrase, KeyScope::User),
            config,
        })
    }

    /// Generates an address key locked with a random token.
    ///
    /// The token is encrypted to and signed by the primary user key, so only
    /// this user can derive the new key's passphrase.
    pub fn generate_address_key(&self, email: &str, primary: bool) -> CryptoResult<GeneratedAddressKey> {
        let mut random = Zeroizing::new(vec![0u8; self.config.ephemeral_token_bytes]);
        rand::rng().fill_bytes(random.as_mut_slice());
        let token = Passphrase::new(hex::encode(random.as_slice()));

        let user_key = self.resolver.unlocked_signing_key()?;
        let signature = sign_detached(token.as_bytes(), &user_key)?;
        let encrypted = encrypt_message(token.as_bytes(), &user_key.public(), None, self.config.cipher)?;
        drop(user_key);
        let encrypted_token = Ciphertext::from_packets(encrypted.key_packet, encrypted.data_packet);

        let address_key = generate_key(&format!("{email} <{email}>"), &token, self.config.key_algorithm)?;
        let fingerprint = address_key.fingerprint();
        debug!("generated address key {fingerprint} for {email}");

        Ok(GeneratedAddressKey {
            key: Key {
                id: fingerprint.clone(),
                private_key: address_key.armored_private()?,
                token: Some(encrypted_token.armored()?.to_string()),
                signature: Some(signature),
                primary,
            },
            fingerprint,
            armored_public: address_key.armored_public()?,
        })
    }
}

impl Crypto for UserCrypto {
    fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    fn config(&self) -> &CryptoConfig {
        &self.config
    }
}

//! Key material resolution.
//!
//! The resolver owns an identity's key records and the mailbox passphrase.
//! It orders candidate keys, derives the passphrase for each one and runs the
//! try-each-key loop that every decryption path goes through.
//!
//! # Passphrases
//!
//! | key record            | passphrase                                          |
//! |-----------------------|-----------------------------------------------------|
//! | no token (legacy)     | mailbox passphrase                                  |
//! | token                 | token plaintext, decrypted with the user keys       |
//! | token + signature     | as above, only if the signature verifies            |
//! | undecryptable token   | none; the key is skipped                            |
//!
//! A key with a token never falls back to the mailbox passphrase.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use pgpmail_openpgp::{
    decrypt_data, decrypt_session_key, verify_detached, KeyRing, Passphrase, PgpKey, SessionKey,
    UnlockedKey,
};
use tracing::{debug, warn};

use crate::ciphertext::Ciphertext;
use crate::error::{CryptoError, CryptoResult};
use crate::types::{Key, KeyScope, User};

/// Candidate keys and passphrases of one identity.
pub struct KeyResolver {
    user: User,
    mailbox_passphrase: Passphrase,
    scope: KeyScope,
    /// Token-derived passphrases by key ID.
    token_passphrases: Mutex<HashMap<String, Passphrase>>,
}

impl KeyResolver {
    pub fn new(user: User, mailbox_passphrase: Passphrase, scope: KeyScope) -> Self {
        Self {
            user,
            mailbox_passphrase,
            scope,
            token_passphrases: Mutex::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> &KeyScope {
        &self.scope
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    fn scoped_keys(&self) -> &[Key] {
        match &self.scope {
            KeyScope::User => &self.user.keys,
            KeyScope::Address(address_id) => self
                .user
                .address(address_id)
                .map(|address| address.keys.as_slice())
                .unwrap_or_default(),
        }
    }

    /// Keys of the identity in priority order.
    pub fn decryption_keys(&self) -> CryptoResult<&[Key]> {
        let keys = self.scoped_keys();
        if !keys.is_empty() {
            return Ok(keys);
        }
        match &self.scope {
            KeyScope::User => {
                warn!("user {} has no keys", self.user.id);
                Err(CryptoError::NoKeysAvailable)
            }
            KeyScope::Address(address_id) => {
                warn!("address {address_id} of user {} has no keys", self.user.id);
                Err(CryptoError::KeysUnavailable(address_id.clone()))
            }
        }
    }

    /// The key used for signing: the first key in priority order.
    pub fn signing_key(&self) -> CryptoResult<&Key> {
        self.scoped_keys().first().ok_or(CryptoError::NoKeysAvailable)
    }

    /// Unlocks the signing key.
    pub fn unlocked_signing_key(&self) -> CryptoResult<UnlockedKey> {
        let key = self.signing_key()?;
        self.unlock(key).ok_or(CryptoError::SigningKeyLocked)
    }

    /// Passphrase for `key`, or `None` when it cannot be derived.
    pub fn passphrase(&self, key: &Key) -> Option<Passphrase> {
        let Some(token) = &key.token else {
            return Some(self.mailbox_passphrase.clone());
        };

        let mut cache = self
            .token_passphrases
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(passphrase) = cache.get(&key.id) {
            return Some(passphrase.clone());
        }

        let passphrase = self.decrypt_token(token, key.signature.as_deref())?;
        debug!("derived passphrase for key {} from its token", key.id);
        cache.insert(key.id.clone(), passphrase.clone());
        Some(passphrase)
    }

    /// Drops every cached token passphrase.
    pub fn clear_cache(&self) {
        self.token_passphrases
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn user_verifiers(&self) -> KeyRing {
        self.user.keys.iter().filter_map(|k| k.parse().ok()).collect()
    }

    fn decrypt_token(&self, token: &str, signature: Option<&str>) -> Option<Passphrase> {
        let ciphertext = Ciphertext::from_armored(token);
        let (key_packet, data_packet) = match (ciphertext.key_packet(), ciphertext.data_packet()) {
            (Ok(kp), Ok(dp)) => (kp, dp),
            (Err(e), _) | (_, Err(e)) => {
                warn!("key token is not a split message: {e}");
                return None;
            }
        };

        // User keys never carry tokens; the mailbox passphrase unlocks them.
        let unlock_user_key = |key: &Key| key.parse().ok()?.try_unlock(&self.mailbox_passphrase);
        let session_key = trial(&self.user.keys, unlock_user_key, |unlocked| {
            decrypt_session_key(key_packet, unlocked)
        });
        let Some(session_key) = session_key else {
            warn!("no user key decrypts the key token");
            return None;
        };

        let token = match decrypt_data(data_packet, &session_key, &KeyRing::new(), Utc::now()) {
            Ok(decrypted) => Passphrase::new(decrypted.data),
            Err(e) => {
                warn!("key token failed to decrypt: {e}");
                return None;
            }
        };

        if let Some(signature) = signature {
            match verify_detached(token.as_bytes(), signature, &self.user_verifiers(), Utc::now()) {
                Ok(verification) if verification.is_valid() => {}
                Ok(verification) => {
                    warn!("key token signature did not verify: {verification:?}");
                    return None;
                }
                Err(e) => {
                    warn!("key token signature is unreadable: {e}");
                    return None;
                }
            }
        }
        Some(token)
    }

    /// Parses `key` and unlocks it with its resolved passphrase.
    pub fn unlock(&self, key: &Key) -> Option<UnlockedKey> {
        let parsed: PgpKey = match key.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("skipping unparseable key {}: {e}", key.id);
                return None;
            }
        };
        let passphrase = self.passphrase(key)?;
        parsed.try_unlock(&passphrase)
    }

    /// Runs `op` with each decryption key in priority order and returns the
    /// first success.
    ///
    /// Keys that fail to unlock or for which `op` yields `None` are skipped.
    /// Every unlocked key is dropped before the next one is tried.
    pub fn try_each_key<T>(
        &self,
        op: impl FnMut(&UnlockedKey) -> Option<T>,
    ) -> CryptoResult<T> {
        let keys = self.decryption_keys()?;
        trial(keys, |key| self.unlock(key), op).ok_or_else(|| {
            warn!("no {} key out of {} succeeded", self.scope, keys.len());
            CryptoError::NoValidDecryptionKey {
                tried: keys.len(),
                scope: self.scope.clone(),
            }
        })
    }

    /// Recovers the session key of `key_packet` with the first key that can.
    pub fn session_key(&self, key_packet: &[u8]) -> CryptoResult<SessionKey> {
        self.try_each_key(|key| decrypt_session_key(key_packet, key))
    }
}

fn trial<T>(
    keys: &[Key],
    mut unlock: impl FnMut(&Key) -> Option<UnlockedKey>,
    mut op: impl FnMut(&UnlockedKey) -> Option<T>,
) -> Option<T> {
    for key in keys {
        let Some(unlocked) = unlock(key) else {
            debug!("key {} could not be unlocked, trying next", key.id);
            continue;
        };
        match op(&unlocked) {
            Some(value) => return Some(value),
            None => debug!("key {} ({}) did not fit, trying next", key.id, unlocked.fingerprint()),
        }
    }
    None
}

impl std::fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyResolver")
            .field("user", &self.user.id)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

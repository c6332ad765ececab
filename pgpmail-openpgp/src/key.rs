//! Key material: parsing, status, unlocking and generation.
//!
//! A [`PgpKey`] is a parsed certificate, either public-only or carrying
//! passphrase-locked secret key material. [`PgpKey::try_unlock`] is the only
//! way to get an [`UnlockedKey`]; a wrong passphrase yields `None`, not an
//! error, so callers can walk through candidate keys with plain control flow.

use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use sequoia_openpgp as openpgp;
use openpgp::cert::prelude::*;
use openpgp::crypto::KeyPair;
use openpgp::packet::{key, Key};
use openpgp::parse::Parse;
use openpgp::serialize::SerializeInto;
use openpgp::types::{KeyFlags, RevocationStatus};
use openpgp::Cert;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PgpError, PgpResult};
use crate::policy;
use crate::secret::Passphrase;

pub(crate) type SecretKey = Key<key::SecretParts, key::UnspecifiedRole>;
pub(crate) type PublicKey = Key<key::PublicParts, key::UnspecifiedRole>;

/// Parsed OpenPGP certificate, public or with locked secret key material.
#[derive(Clone, Debug, PartialEq)]
pub struct PgpKey {
    cert: Cert,
}

/// Point-in-time view of what a key can be used for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyStatus {
    pub valid: bool,
    pub expired: bool,
    pub revoked: bool,
    pub can_encrypt: bool,
    pub can_sign: bool,
}

impl PgpKey {
    /// Parses an armored key.
    pub fn from_armored(armored: &str) -> PgpResult<Self> {
        Self::from_bytes(armored.as_bytes())
    }

    /// Parses a key in either binary or armored form.
    pub fn from_bytes(bytes: &[u8]) -> PgpResult<Self> {
        Cert::from_bytes(bytes)
            .map(|cert| Self { cert })
            .map_err(|e| PgpError::InvalidKey(e.to_string()))
    }

    pub fn fingerprint(&self) -> String {
        self.cert.fingerprint().to_hex()
    }

    pub fn key_id(&self) -> String {
        self.cert.keyid().to_hex()
    }

    /// Whether the key carries secret key material (locked or not).
    pub fn is_private(&self) -> bool {
        self.cert.is_tsk()
    }

    /// Returns the public half of this key.
    pub fn to_public(&self) -> PgpKey {
        Self {
            cert: self.cert.clone().strip_secret_key_material(),
        }
    }

    pub fn public_bytes(&self) -> PgpResult<Vec<u8>> {
        self.cert
            .to_vec()
            .map_err(|e| PgpError::InvalidKey(format!("serializing public key: {e}")))
    }

    /// Binary secret key, still locked. `None` for public keys.
    pub fn private_bytes(&self) -> PgpResult<Option<Vec<u8>>> {
        if !self.is_private() {
            return Ok(None);
        }
        self.cert
            .as_tsk()
            .to_vec()
            .map(Some)
            .map_err(|e| PgpError::InvalidKey(format!("serializing private key: {e}")))
    }

    pub fn armored_public(&self) -> PgpResult<String> {
        let bytes = self
            .cert
            .armored()
            .to_vec()
            .map_err(|e| PgpError::Armor(format!("armoring public key: {e}")))?;
        String::from_utf8(bytes).map_err(|e| PgpError::Armor(e.to_string()))
    }

    pub fn armored_private(&self) -> PgpResult<String> {
        if !self.is_private() {
            return Err(PgpError::InvalidKey(format!(
                "{} has no secret key material",
                self.fingerprint()
            )));
        }
        let bytes = self
            .cert
            .as_tsk()
            .armored()
            .to_vec()
            .map_err(|e| PgpError::Armor(format!("armoring private key: {e}")))?;
        String::from_utf8(bytes).map_err(|e| PgpError::Armor(e.to_string()))
    }

    /// Evaluates the key under the standard policy at `at`.
    pub fn status(&self, at: DateTime<Utc>) -> KeyStatus {
        let valid_cert = match self.cert.with_policy(policy(), SystemTime::from(at)) {
            Ok(vc) => vc,
            Err(e) => {
                debug!("key {} rejected by policy: {e}", self.fingerprint());
                return KeyStatus::default();
            }
        };

        let revoked = matches!(valid_cert.revocation_status(), RevocationStatus::Revoked(_));
        let expired = valid_cert.alive().is_err();
        let can_encrypt = valid_cert
            .keys()
            .supported()
            .alive()
            .revoked(false)
            .for_transport_encryption()
            .for_storage_encryption()
            .next()
            .is_some();
        let can_sign = valid_cert
            .keys()
            .supported()
            .alive()
            .revoked(false)
            .for_signing()
            .next()
            .is_some();

        KeyStatus {
            valid: !revoked && !expired,
            expired,
            revoked,
            can_encrypt,
            can_sign,
        }
    }

    /// First live encryption-capable (sub)key at `at`.
    pub(crate) fn encryption_key(&self, at: SystemTime) -> PgpResult<PublicKey> {
        let valid_cert = self
            .cert
            .with_policy(policy(), at)
            .map_err(|e| PgpError::InvalidKey(format!("{}: {e}", self.fingerprint())))?;
        valid_cert
            .keys()
            .supported()
            .alive()
            .revoked(false)
            .for_transport_encryption()
            .for_storage_encryption()
            .next()
            .map(|ka| ka.key().clone())
            .ok_or_else(|| PgpError::NoEncryptionKey(self.fingerprint()))
    }

    pub(crate) fn cert(&self) -> &Cert {
        &self.cert
    }

    /// Unlocks every secret (sub)key with `passphrase`.
    ///
    /// Returns `None` when the key has no secret material or when the
    /// passphrase does not unlock all of it.
    pub fn try_unlock(&self, passphrase: &Passphrase) -> Option<UnlockedKey> {
        let password = passphrase.to_password();
        let mut secrets = Vec::new();

        for ka in self.cert.keys().secret() {
            let key: SecretKey = ka.key().clone();
            if !key.secret().is_encrypted() {
                secrets.push(key);
                continue;
            }
            match key.decrypt_secret(&password) {
                Ok(unlocked) => secrets.push(unlocked),
                Err(e) => {
                    debug!("passphrase does not unlock {}: {e}", ka.key().fingerprint());
                    return None;
                }
            }
        }

        if secrets.is_empty() {
            debug!("key {} has no secret key material", self.fingerprint());
            return None;
        }
        Some(UnlockedKey {
            cert: self.cert.clone(),
            secrets,
        })
    }
}

/// A key whose secret material has been decrypted.
///
/// The decrypted MPIs live in protected memory that is zeroed when the value
/// is dropped; keep instances scoped to a single operation.
pub struct UnlockedKey {
    cert: Cert,
    secrets: Vec<SecretKey>,
}

impl UnlockedKey {
    pub fn fingerprint(&self) -> String {
        self.cert.fingerprint().to_hex()
    }

    pub fn public(&self) -> PgpKey {
        PgpKey {
            cert: self.cert.clone().strip_secret_key_material(),
        }
    }

    pub(crate) fn secrets(&self) -> &[SecretKey] {
        &self.secrets
    }

    /// Keypair of the first live signing-capable (sub)key at `at`.
    pub(crate) fn signing_keypair(&self, at: SystemTime) -> PgpResult<KeyPair> {
        let valid_cert = self
            .cert
            .with_policy(policy(), at)
            .map_err(|e| PgpError::InvalidKey(format!("{}: {e}", self.fingerprint())))?;

        for ka in valid_cert.keys().supported().alive().revoked(false).for_signing() {
            let fingerprint = ka.key().fingerprint();
            if let Some(secret) = self.secrets.iter().find(|k| k.fingerprint() == fingerprint) {
                return secret
                    .clone()
                    .into_keypair()
                    .map_err(|e| PgpError::Signing(e.to_string()));
            }
        }
        Err(PgpError::NoSigningKey(self.fingerprint()))
    }
}

impl std::fmt::Debug for UnlockedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockedKey")
            .field("fingerprint", &self.fingerprint())
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

/// Ordered set of public keys, typically signature verifiers.
#[derive(Clone, Debug, Default)]
pub struct KeyRing {
    keys: Vec<PgpKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: impl IntoIterator<Item = PgpKey>) -> Self {
        Self {
            keys: keys.into_iter().map(|k| k.to_public()).collect(),
        }
    }

    /// Parses one armored block that may hold several certificates.
    pub fn from_armored(armored: &str) -> PgpResult<Self> {
        let parser = CertParser::from_bytes(armored.as_bytes())
            .map_err(|e| PgpError::InvalidKey(e.to_string()))?;
        let mut ring = Self::new();
        for cert in parser {
            let cert = cert.map_err(|e| PgpError::InvalidKey(e.to_string()))?;
            ring.push(PgpKey { cert });
        }
        Ok(ring)
    }

    pub fn push(&mut self, key: PgpKey) {
        self.keys.push(key.to_public());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PgpKey> {
        self.keys.iter()
    }

    pub(crate) fn certs(&self) -> Vec<Cert> {
        self.keys.iter().map(|k| k.cert().clone()).collect()
    }
}

impl FromIterator<PgpKey> for KeyRing {
    fn from_iter<I: IntoIterator<Item = PgpKey>>(iter: I) -> Self {
        Self::from_keys(iter)
    }
}

/// Public key algorithm for generated keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    Curve25519,
    Rsa3072,
    Rsa4096,
}

impl KeyAlgorithm {
    fn cipher_suite(self) -> CipherSuite {
        match self {
            KeyAlgorithm::Curve25519 => CipherSuite::Cv25519,
            KeyAlgorithm::Rsa3072 => CipherSuite::RSA3k,
            KeyAlgorithm::Rsa4096 => CipherSuite::RSA4k,
        }
    }
}

/// Parameters for [`generate_key_with`].
#[derive(Clone, Debug)]
pub struct KeyGenerationParams {
    pub user_id: String,
    pub algorithm: KeyAlgorithm,
    /// Backdates the key; defaults to now.
    pub creation_time: Option<DateTime<Utc>>,
    /// Lifetime counted from the creation time; `None` never expires.
    pub validity: Option<Duration>,
}

impl KeyGenerationParams {
    pub fn new(user_id: impl Into<String>, algorithm: KeyAlgorithm) -> Self {
        Self {
            user_id: user_id.into(),
            algorithm,
            creation_time: None,
            validity: None,
        }
    }
}

/// Generates a certification primary key with a signing subkey and an
/// encryption subkey, locked with `passphrase`.
pub fn generate_key(
    user_id: &str,
    passphrase: &Passphrase,
    algorithm: KeyAlgorithm,
) -> PgpResult<PgpKey> {
    generate_key_with(&KeyGenerationParams::new(user_id, algorithm), passphrase)
}

/// Like [`generate_key`] with control over creation time and validity.
///
/// An empty passphrase leaves the secret key material unencrypted.
pub fn generate_key_with(
    params: &KeyGenerationParams,
    passphrase: &Passphrase,
) -> PgpResult<PgpKey> {
    let encryption_flags = KeyFlags::empty()
        .set_transport_encryption()
        .set_storage_encryption();

    let mut builder = CertBuilder::new()
        .set_cipher_suite(params.algorithm.cipher_suite())
        .add_userid(params.user_id.as_str())
        .add_signing_subkey()
        .add_subkey(encryption_flags, None::<std::time::Duration>, None::<CipherSuite>);

    if !passphrase.is_empty() {
        builder = builder.set_password(Some(passphrase.to_password()));
    }
    if let Some(created) = params.creation_time {
        builder = builder.set_creation_time(SystemTime::from(created));
    }
    if let Some(validity) = params.validity {
        let validity = validity
            .to_std()
            .map_err(|e| PgpError::KeyGeneration(format!("invalid validity period: {e}")))?;
        builder = builder.set_validity_period(Some(validity));
    }

    let (cert, _revocation) = builder
        .generate()
        .map_err(|e| PgpError::KeyGeneration(e.to_string()))?;
    debug!("generated key {}", cert.fingerprint());
    Ok(PgpKey { cert })
}

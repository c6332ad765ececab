//! Read-only key introspection.

use chrono::{DateTime, Utc};
use pgpmail_openpgp::PgpKey;
use tracing::warn;

use crate::error::{CryptoError, CryptoResult};

/// Snapshot of one key's identity and status.
///
/// `compromised` is a caller-side annotation. Marking a key compromised
/// changes nothing about the key material or the key store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyInformation {
    fingerprint: String,
    expired: bool,
    valid: bool,
    can_encrypt: bool,
    compromised: bool,
    public_key: Option<Vec<u8>>,
    private_key: Option<Vec<u8>>,
}

impl KeyInformation {
    /// Sentinel for keys that could not be inspected.
    pub fn empty() -> Self {
        Self {
            fingerprint: String::new(),
            expired: true,
            valid: false,
            can_encrypt: false,
            compromised: false,
            public_key: None,
            private_key: None,
        }
    }

    pub fn from_key(key: &PgpKey, at: DateTime<Utc>) -> CryptoResult<Self> {
        let status = key.status(at);
        Ok(Self {
            fingerprint: key.fingerprint(),
            expired: status.expired,
            valid: status.valid,
            can_encrypt: status.can_encrypt,
            compromised: false,
            public_key: Some(key.public_bytes()?),
            private_key: key.private_bytes()?,
        })
    }

    /// Inspects an armored key; any failure yields [`KeyInformation::empty`].
    pub fn from_armored(armored: &str, at: DateTime<Utc>) -> Self {
        let info = PgpKey::from_armored(armored)
            .map_err(CryptoError::from)
            .and_then(|key| Self::from_key(&key, at));
        match info {
            Ok(info) => info,
            Err(e) => {
                warn!("key introspection failed: {e}");
                Self::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprint.is_empty()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn can_encrypt(&self) -> bool {
        self.can_encrypt
    }

    pub fn is_compromised(&self) -> bool {
        self.compromised
    }

    /// Flags the key as compromised. There is no way to clear the flag.
    pub fn mark_compromised(&mut self) {
        self.compromised = true;
    }

    pub fn public_key(&self) -> Option<&[u8]> {
        self.public_key.as_deref()
    }

    /// Locked secret key bytes, when the key carried them.
    pub fn private_key(&self) -> Option<&[u8]> {
        self.private_key.as_deref()
    }
}

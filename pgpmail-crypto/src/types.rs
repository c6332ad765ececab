//! Key records and identities as delivered by the key store.

use std::fmt;

use pgpmail_openpgp::PgpKey;
use serde::{Deserialize, Serialize};

use crate::error::CryptoResult;

/// One stored key pair.
///
/// Migrated accounts carry a `Token`: an armored message, encrypted to the
/// user's keys, whose plaintext is this key's passphrase. Legacy keys have
/// none and unlock with the mailbox passphrase directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Key {
    #[serde(rename = "ID")]
    pub id: String,
    /// Armored private key, locked.
    pub private_key: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Armored detached signature over the token plaintext.
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub primary: bool,
}

impl Key {
    pub fn new(id: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            private_key: private_key.into(),
            token: None,
            signature: None,
            primary: false,
        }
    }

    /// Whether the passphrase comes from a token rather than the mailbox
    /// passphrase.
    pub fn is_migrated(&self) -> bool {
        self.token.is_some()
    }

    pub fn parse(&self) -> CryptoResult<PgpKey> {
        Ok(PgpKey::from_armored(&self.private_key)?)
    }
}

/// An address of a user, with its own keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    #[serde(rename = "ID")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub keys: Vec<Key>,
}

/// A user with account-level keys and per-address keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub keys: Vec<Key>,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

impl User {
    pub fn from_json(json: &str) -> CryptoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn address(&self, address_id: &str) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == address_id)
    }
}

/// Which of an identity's key lists an operation draws from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyScope {
    User,
    Address(String),
}

impl fmt::Display for KeyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyScope::User => f.write_str("user"),
            KeyScope::Address(id) => write!(f, "address {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_parses_key_store_json() {
        let json = r#"{
            "ID": "u1",
            "Keys": [{ "ID": "k1", "PrivateKey": "armored", "Primary": true }],
            "Addresses": [{
                "ID": "a1",
                "Email": "alice@example.com",
                "Keys": [{
                    "ID": "k2",
                    "PrivateKey": "armored",
                    "Token": "token",
                    "Signature": "signature"
                }]
            }]
        }"#;

        let user = User::from_json(json).unwrap();
        assert_eq!(user.id, "u1");
        assert!(user.keys[0].primary);
        assert!(!user.keys[0].is_migrated());

        let address = user.address("a1").unwrap();
        assert_eq!(address.email, "alice@example.com");
        assert!(address.keys[0].is_migrated());
        assert!(!address.keys[0].primary);
        assert!(user.address("missing").is_none());
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        assert!(matches!(
            User::from_json("{"),
            Err(crate::error::CryptoError::Serialization(_))
        ));
    }

    #[test]
    fn scope_display() {
        assert_eq!(KeyScope::User.to_string(), "user");
        assert_eq!(KeyScope::Address("a1".into()).to_string(), "address a1");
    }
}

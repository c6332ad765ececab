//! End-to-end encryption core for pgpmail.
//!
//! Provides the crypto facades the mail client talks to:
//! - [`UserCrypto`] for account-level keys
//! - [`AddressCrypto`] for the keys of one address, with PGP/MIME
//!   decryption and ephemeral tokens for outside recipients
//!
//! # Multiple keys
//!
//! Identities accumulate keys over time (rotation, migration). Decryption
//! walks an identity's keys in priority order, unlocking each with its
//! passphrase, and stops at the first key that opens the message. Only when
//! every key fails does the caller see an error, and that error reports how
//! many keys were tried, never which passphrase.
//!
//! # Passphrases
//!
//! Legacy keys unlock with the mailbox passphrase. Migrated keys carry a
//! token encrypted to the user keys; its plaintext is the key's passphrase.
//! See [`resolver`] for the full decision table.

pub mod address;
pub mod ciphertext;
pub mod config;
pub mod crypto;
pub mod error;
pub mod key_info;
pub mod mime;
pub mod resolver;
pub mod result;
pub mod types;
pub mod user;

pub use address::{AddressCrypto, EphemeralToken};
pub use ciphertext::Ciphertext;
pub use config::CryptoConfig;
pub use crypto::Crypto;
pub use error::{CryptoError, CryptoResult};
pub use key_info::KeyInformation;
pub use mime::{ContentType, Headers, MimeDecryption};
pub use resolver::KeyResolver;
pub use result::{BinaryDecryptionResult, DecryptionResult, TextDecryptionResult};
pub use types::{Address, Key, KeyScope, User};
pub use user::{GeneratedAddressKey, UserCrypto};

pub use pgpmail_openpgp::{Cipher, KeyAlgorithm, KeyRing, Passphrase, PgpKey, SessionKey, Verification};

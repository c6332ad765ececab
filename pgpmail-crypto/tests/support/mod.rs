//! Shared fixtures for crypto core integration tests.
//!
//! Keys are generated per test; nothing is read from disk.

#![allow(dead_code)]

use pgpmail_crypto::{Address, Ciphertext, Key, User, UserCrypto};
use pgpmail_openpgp::{encrypt_message, generate_key, Cipher, KeyAlgorithm, Passphrase, PgpKey};

pub const MAILBOX_PASSPHRASE: &str = "mailbox passphrase";
pub const USER_ID: &str = "user-1";
pub const ADDRESS_ID: &str = "address-1";
pub const EMAIL: &str = "alice@example.com";

pub fn mailbox() -> Passphrase {
    Passphrase::from(MAILBOX_PASSPHRASE)
}

/// Opt-in log output: `RUST_LOG=pgpmail_crypto=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A legacy key record locked with `passphrase`, and its public half.
pub fn legacy_key(id: &str, passphrase: &str) -> (Key, PgpKey) {
    let key = generate_key(
        &format!("{id}@example.com"),
        &Passphrase::from(passphrase),
        KeyAlgorithm::Curve25519,
    )
    .expect("key generation must succeed");
    let record = Key::new(id, key.armored_private().expect("armoring must succeed"));
    (record, key.to_public())
}

pub fn user_with_keys(keys: Vec<Key>) -> User {
    User {
        id: USER_ID.into(),
        keys,
        addresses: Vec::new(),
    }
}

pub fn address(keys: Vec<Key>) -> Address {
    Address {
        id: ADDRESS_ID.into(),
        email: EMAIL.into(),
        keys,
    }
}

/// A migrated account: one legacy user key and one token-locked address key.
pub struct Account {
    pub user: User,
    pub user_public: PgpKey,
    pub address_public: PgpKey,
}

pub fn migrated_account() -> Account {
    let (mut user_key, user_public) = legacy_key("user-key-1", MAILBOX_PASSPHRASE);
    user_key.primary = true;
    let mut user = user_with_keys(vec![user_key]);

    let generated = UserCrypto::new(user.clone(), mailbox())
        .expect("default config is valid")
        .generate_address_key(EMAIL, true)
        .expect("address key generation must succeed");
    user.addresses.push(address(vec![generated.key]));

    Account {
        user,
        user_public,
        address_public: PgpKey::from_armored(&generated.armored_public)
            .expect("generated public key must parse"),
    }
}

/// Armored message of `data` encrypted to `recipient`.
pub fn armored_to(data: &[u8], recipient: &PgpKey) -> String {
    let message = encrypt_message(data, recipient, None, Cipher::Aes256)
        .expect("encryption must succeed");
    Ciphertext::from_packets(message.key_packet, message.data_packet)
        .armored()
        .expect("armoring must succeed")
        .to_string()
}

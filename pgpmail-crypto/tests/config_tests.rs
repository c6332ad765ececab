mod support;

use pgpmail_crypto::{Cipher, Crypto, CryptoConfig, CryptoError, KeyAlgorithm, UserCrypto};
use pretty_assertions::assert_eq;
use support::*;

#[test]
fn default_cipher() {
    assert_eq!(CryptoConfig::default().cipher, Cipher::Aes256);
}

#[test]
fn default_key_algorithm() {
    assert_eq!(CryptoConfig::default().key_algorithm, KeyAlgorithm::Curve25519);
}

#[test]
fn default_token_size() {
    assert_eq!(CryptoConfig::default().ephemeral_token_bytes, 32);
}

#[test]
fn default_is_valid() {
    assert!(CryptoConfig::default().validate().is_ok());
}

#[test]
fn serialization_roundtrip() {
    let config = CryptoConfig {
        cipher: Cipher::Aes128,
        key_algorithm: KeyAlgorithm::Rsa3072,
        ephemeral_token_bytes: 24,
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed: CryptoConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn serialized_names_are_lowercase() {
    let json = serde_json::to_value(CryptoConfig::default()).unwrap();
    assert_eq!(json["cipher"], "aes256");
    assert_eq!(json["key_algorithm"], "curve25519");
    assert_eq!(json["ephemeral_token_bytes"], 32);
}

#[test]
fn short_tokens_are_rejected() {
    let config = CryptoConfig {
        ephemeral_token_bytes: 8,
        ..CryptoConfig::default()
    };
    assert!(matches!(config.validate(), Err(CryptoError::Config(_))));
    assert!(matches!(
        UserCrypto::with_config(user_with_keys(Vec::new()), mailbox(), config),
        Err(CryptoError::Config(_))
    ));
}

#[test]
fn configured_cipher_is_used_for_new_messages() {
    let (record, public) = legacy_key("k1", MAILBOX_PASSPHRASE);
    let config = CryptoConfig {
        cipher: Cipher::Aes128,
        ..CryptoConfig::default()
    };
    let crypto = UserCrypto::with_config(user_with_keys(vec![record]), mailbox(), config).unwrap();

    let ciphertext = crypto.encrypt_attachment(b"x", &public, false).unwrap();
    let session_key = crypto.decrypt_session_key(ciphertext.key_packet().unwrap()).unwrap();
    assert_eq!(session_key.cipher(), Cipher::Aes128);
    assert_eq!(session_key.as_bytes().len(), 16);
}

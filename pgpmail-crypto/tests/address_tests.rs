mod support;

use chrono::Utc;
use pgpmail_crypto::{AddressCrypto, Crypto, CryptoError, UserCrypto, Verification};
use pgpmail_openpgp::{KeyRing, Passphrase};
use pretty_assertions::assert_eq;
use support::*;

const MIME_BODY: &str = "Content-Type: multipart/alternative; boundary=\"alt\"\r\n\
Subject: quarterly numbers\r\n\
\r\n\
--alt\r\n\
Content-Type: text/plain\r\n\
\r\n\
see attached\r\n\
--alt--\r\n";

// ── PGP/MIME ──

#[test]
fn mime_message_splits_headers_and_verifies() {
    let account = migrated_account();
    let crypto = AddressCrypto::new(account.user, mailbox(), ADDRESS_ID).unwrap();
    let ciphertexts = crypto
        .encrypt(MIME_BODY.as_bytes(), &[account.address_public.clone()], true)
        .unwrap();

    let mime = crypto
        .decrypt_mime(
            &ciphertexts[0],
            &KeyRing::from_keys([account.address_public]),
            Utc::now(),
        )
        .unwrap();

    assert_eq!(mime.content_type().mime_type(), "multipart/alternative");
    assert_eq!(mime.content_type().boundary(), Some("alt"));
    assert_eq!(mime.header("subject"), Some("quarterly numbers"));
    assert!(mime.body().starts_with("--alt\r\n"));
    assert!(mime.verification().is_valid());
    assert!(mime.signed_at().is_some());
}

#[test]
fn unsigned_mime_message_has_no_signature() {
    let account = migrated_account();
    let crypto = AddressCrypto::new(account.user, mailbox(), ADDRESS_ID).unwrap();
    let ciphertexts = crypto
        .encrypt(MIME_BODY.as_bytes(), &[account.address_public], false)
        .unwrap();

    let mime = crypto
        .decrypt_mime(&ciphertexts[0], &KeyRing::new(), Utc::now())
        .unwrap();
    assert_eq!(mime.verification(), Verification::NoSignature);
    assert_eq!(mime.headers().len(), 2);
}

// ── Ephemeral Tokens ──

#[test]
fn ephemeral_token_is_256_bits_of_hex() {
    let account = migrated_account();
    let crypto = AddressCrypto::new(account.user, mailbox(), ADDRESS_ID).unwrap();

    let token = crypto.generate_ephemeral_token(&Passphrase::from("outside")).unwrap();
    assert_eq!(token.token().len(), 64);
    assert!(token.token().chars().all(|c| c.is_ascii_hexdigit()));
    assert!(token.encrypted().starts_with("-----BEGIN PGP MESSAGE-----"));
    assert!(!format!("{token:?}").contains(token.token()));
}

#[test]
fn ephemeral_tokens_are_unique() {
    let account = migrated_account();
    let crypto = AddressCrypto::new(account.user, mailbox(), ADDRESS_ID).unwrap();
    let password = Passphrase::from("outside");

    let a = crypto.generate_ephemeral_token(&password).unwrap();
    let b = crypto.generate_ephemeral_token(&password).unwrap();
    assert_ne!(a.token(), b.token());
}

#[test]
fn ephemeral_token_opens_with_password_only() {
    let account = migrated_account();
    let crypto = AddressCrypto::new(account.user, mailbox(), ADDRESS_ID).unwrap();
    let password = Passphrase::from("outside");
    let token = crypto.generate_ephemeral_token(&password).unwrap();

    let opened = crypto.decrypt_ephemeral_token(token.encrypted(), &password).unwrap();
    assert_eq!(opened.token(), token.token());
    assert!(matches!(
        crypto.decrypt_ephemeral_token(token.encrypted(), &Passphrase::from("guess")),
        Err(CryptoError::Pgp(_))
    ));
}

// ── Address Key Generation ──

#[test]
fn generated_address_key_record_is_migrated() {
    let (mut user_key, _) = legacy_key("user-key", MAILBOX_PASSPHRASE);
    user_key.primary = true;
    let crypto = UserCrypto::new(user_with_keys(vec![user_key]), mailbox()).unwrap();

    let generated = crypto.generate_address_key(EMAIL, false).unwrap();
    assert_eq!(generated.key.id, generated.fingerprint);
    assert!(generated.key.is_migrated());
    assert!(generated.key.signature.is_some());
    assert!(!generated.key.primary);
    assert!(generated.armored_public.starts_with("-----BEGIN PGP PUBLIC KEY BLOCK-----"));

    // The token is locked, not the mailbox passphrase.
    let parsed = generated.key.parse().unwrap();
    assert!(parsed.try_unlock(&mailbox()).is_none());
}

#[test]
fn address_key_generation_needs_an_unlockable_user_key() {
    let (user_key, _) = legacy_key("user-key", MAILBOX_PASSPHRASE);
    let crypto = UserCrypto::new(user_with_keys(vec![user_key]), Passphrase::from("wrong")).unwrap();
    assert!(matches!(
        crypto.generate_address_key(EMAIL, true),
        Err(CryptoError::SigningKeyLocked)
    ));
}

#[test]
fn address_id_is_exposed() {
    let account = migrated_account();
    let crypto = AddressCrypto::new(account.user, mailbox(), ADDRESS_ID).unwrap();
    assert_eq!(crypto.address_id(), ADDRESS_ID);
}

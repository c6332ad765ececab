//! Message encryption and data packet decryption.

use std::io::{Read, Write};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use sequoia_openpgp as openpgp;
use openpgp::armor::Kind;
use openpgp::parse::stream::DecryptorBuilder;
use openpgp::parse::Parse;
use openpgp::serialize::stream::{
    Armorer, Encryptor2, LiteralWriter, Message, Recipient, Signer,
};
use tracing::debug;

use crate::armor::dearmor_message;
use crate::error::{PgpError, PgpResult};
use crate::helper::Helper;
use crate::key::{KeyRing, PgpKey, UnlockedKey};
use crate::packets::split_message;
use crate::policy;
use crate::secret::{Cipher, Passphrase, SessionKey};
use crate::signature::Verification;

/// A message encrypted for one recipient, already split.
#[derive(Debug)]
pub struct EncryptedMessage {
    pub key_packet: Vec<u8>,
    pub data_packet: Vec<u8>,
    /// Session key of the data packet, for wrapping to further recipients.
    pub session_key: SessionKey,
}

/// Plaintext of a data packet with the status of its embedded signatures.
#[derive(Debug)]
pub struct DecryptedData {
    pub data: Vec<u8>,
    pub verification: Verification,
}

/// Encrypts `data` to `recipient` under a fresh session key, optionally
/// signing it inline with `signer`.
pub fn encrypt_message(
    data: &[u8],
    recipient: &PgpKey,
    signer: Option<&UnlockedKey>,
    cipher: Cipher,
) -> PgpResult<EncryptedMessage> {
    let now = SystemTime::now();
    let encryption_key = recipient.encryption_key(now)?;
    let session_key = SessionKey::generate(cipher);

    let mut sink = Vec::new();
    {
        let message = Message::new(&mut sink);
        let message = Encryptor2::with_session_key(
            message,
            session_key.algorithm(),
            session_key.inner().clone(),
        )
        .map_err(|e| PgpError::Encryption(e.to_string()))?
        .add_recipients([Recipient::from(&encryption_key)])
        .build()
        .map_err(|e| PgpError::Encryption(format!("encryptor build failed: {e}")))?;

        let message = match signer {
            Some(signer) => {
                let keypair = signer.signing_keypair(now)?;
                Signer::new(message, keypair)
                    .build()
                    .map_err(|e| PgpError::Signing(format!("signer build failed: {e}")))?
            }
            None => message,
        };

        let mut literal = LiteralWriter::new(message)
            .build()
            .map_err(|e| PgpError::Encryption(format!("literal writer failed: {e}")))?;
        literal.write_all(data)?;
        literal
            .finalize()
            .map_err(|e| PgpError::Encryption(format!("finalize failed: {e}")))?;
    }

    let (key_packet, data_packet) = split_message(&sink)?;
    debug!(
        "encrypted {} bytes to {} (signed: {})",
        data.len(),
        recipient.fingerprint(),
        signer.is_some()
    );
    Ok(EncryptedMessage {
        key_packet,
        data_packet,
        session_key,
    })
}

/// Decrypts a data packet with an already recovered session key, checking
/// embedded signatures against `verifiers` at `at`.
///
/// Fails when the packet does not authenticate under `session_key`; partial
/// plaintext is never returned.
pub fn decrypt_data(
    data_packet: &[u8],
    session_key: &SessionKey,
    verifiers: &KeyRing,
    at: DateTime<Utc>,
) -> PgpResult<DecryptedData> {
    let helper = Helper::with_session_key(session_key, verifiers);
    let mut decryptor = DecryptorBuilder::from_bytes(data_packet)
        .map_err(|e| PgpError::Decryption(format!("malformed data packet: {e}")))?
        .with_policy(policy(), SystemTime::from(at), helper)
        .map_err(|e| PgpError::Decryption(e.to_string()))?;

    let mut data = Vec::new();
    decryptor
        .read_to_end(&mut data)
        .map_err(|e| PgpError::Decryption(format!("data packet failed to authenticate: {e}")))?;

    Ok(DecryptedData {
        data,
        verification: decryptor.into_helper().verification(),
    })
}

/// Encrypts `data` under `password` alone and armors the result.
pub fn encrypt_with_password(data: &[u8], password: &Passphrase, cipher: Cipher) -> PgpResult<String> {
    let mut sink = Vec::new();
    {
        let message = Message::new(&mut sink);
        let message = Armorer::new(message)
            .kind(Kind::Message)
            .build()
            .map_err(|e| PgpError::Armor(format!("armorer build failed: {e}")))?;
        let message = Encryptor2::with_passwords(message, Some(password.to_password()))
            .symmetric_algo(cipher.algorithm())
            .build()
            .map_err(|e| PgpError::Encryption(format!("encryptor build failed: {e}")))?;
        let mut literal = LiteralWriter::new(message)
            .build()
            .map_err(|e| PgpError::Encryption(format!("literal writer failed: {e}")))?;
        literal.write_all(data)?;
        literal
            .finalize()
            .map_err(|e| PgpError::Encryption(format!("finalize failed: {e}")))?;
    }
    String::from_utf8(sink).map_err(|e| PgpError::Armor(e.to_string()))
}

/// Reverses [`encrypt_with_password`].
pub fn decrypt_with_password(armored: &str, password: &Passphrase) -> PgpResult<Vec<u8>> {
    let message = dearmor_message(armored)?;
    let helper = Helper::with_password(password.to_password());
    let mut decryptor = DecryptorBuilder::from_bytes(&message)
        .map_err(|e| PgpError::Decryption(format!("malformed message: {e}")))?
        .with_policy(policy(), None::<SystemTime>, helper)
        .map_err(|e| PgpError::Decryption(e.to_string()))?;

    let mut data = Vec::new();
    decryptor
        .read_to_end(&mut data)
        .map_err(|e| PgpError::Decryption(e.to_string()))?;
    Ok(data)
}

//! Operations shared by the user and address facades.

use chrono::{DateTime, Utc};
use pgpmail_openpgp::{
    decrypt_data, encrypt_message, encrypt_session_key, encrypt_session_key_with_password,
    sign_detached, verify_detached, KeyRing, Passphrase, PgpKey, SessionKey, Verification,
};
use tracing::{debug, warn};

use crate::ciphertext::Ciphertext;
use crate::config::CryptoConfig;
use crate::error::{CryptoError, CryptoResult};
use crate::key_info::KeyInformation;
use crate::resolver::KeyResolver;
use crate::result::{BinaryDecryptionResult, DecryptionResult, TextDecryptionResult};

/// Encrypt, decrypt, sign and verify on behalf of one identity.
///
/// Implementors supply the resolver for their key scope; every operation is
/// provided on top of it. Decryption recovers the session key through
/// [`KeyResolver::try_each_key`], so callers never need to know which of the
/// identity's keys a message was encrypted to.
pub trait Crypto {
    fn resolver(&self) -> &KeyResolver;

    fn config(&self) -> &CryptoConfig;

    /// Decrypts a text message without checking signatures.
    fn decrypt(&self, ciphertext: &Ciphertext) -> CryptoResult<TextDecryptionResult> {
        self.decrypt_binary(ciphertext)?.into_text()
    }

    fn decrypt_binary(&self, ciphertext: &Ciphertext) -> CryptoResult<BinaryDecryptionResult> {
        open(
            self.resolver(),
            ciphertext.key_packet()?,
            ciphertext.data_packet()?,
            None,
            Utc::now(),
        )
    }

    /// Decrypts a text message and checks its signatures against
    /// `verifiers` at `at`.
    ///
    /// A data packet that fails to authenticate is reported as an invalid
    /// signature with an empty payload rather than as an error.
    fn decrypt_and_verify(
        &self,
        ciphertext: &Ciphertext,
        verifiers: &KeyRing,
        at: DateTime<Utc>,
    ) -> CryptoResult<TextDecryptionResult> {
        open(
            self.resolver(),
            ciphertext.key_packet()?,
            ciphertext.data_packet()?,
            Some(verifiers),
            at,
        )?
        .into_text()
    }

    /// Decrypts an attachment delivered as separate key and data packets.
    fn decrypt_attachment(
        &self,
        key_packet: &[u8],
        data_packet: &[u8],
        verifiers: Option<&KeyRing>,
        at: DateTime<Utc>,
    ) -> CryptoResult<BinaryDecryptionResult> {
        open(self.resolver(), key_packet, data_packet, verifiers, at)
    }

    fn decrypt_session_key(&self, key_packet: &[u8]) -> CryptoResult<SessionKey> {
        self.resolver().session_key(key_packet)
    }

    /// Armored detached signature over `data` by the signing key.
    fn sign(&self, data: &[u8]) -> CryptoResult<String> {
        let key = self.resolver().unlocked_signing_key()?;
        Ok(sign_detached(data, &key)?)
    }

    /// Checks a detached signature. Unreadable signatures are `Failed`.
    fn verify(
        &self,
        data: &[u8],
        signature: &str,
        verifiers: &KeyRing,
        at: DateTime<Utc>,
    ) -> Verification {
        match verify_detached(data, signature, verifiers, at) {
            Ok(verification) => verification,
            Err(e) => {
                debug!("signature could not be checked: {e}");
                Verification::Failed
            }
        }
    }

    /// Encrypts `plaintext` once and returns one ciphertext per recipient,
    /// in recipient order.
    ///
    /// All ciphertexts share the same data packet; only the key packet
    /// differs. With `sign` the payload carries an inline signature by the
    /// signing key.
    fn encrypt(
        &self,
        plaintext: &[u8],
        recipients: &[PgpKey],
        sign: bool,
    ) -> CryptoResult<Vec<Ciphertext>> {
        let (first, rest) = recipients.split_first().ok_or(CryptoError::NoRecipients)?;
        let signer = if sign {
            Some(self.resolver().unlocked_signing_key()?)
        } else {
            None
        };

        let message = encrypt_message(plaintext, first, signer.as_ref(), self.config().cipher)?;
        drop(signer);

        let mut ciphertexts = Vec::with_capacity(recipients.len());
        for recipient in rest {
            let key_packet = encrypt_session_key(&message.session_key, recipient)?;
            ciphertexts.push(Ciphertext::from_packets(key_packet, message.data_packet.clone()));
        }
        ciphertexts.insert(0, Ciphertext::from_packets(message.key_packet, message.data_packet));
        Ok(ciphertexts)
    }

    /// Encrypts an attachment for a single recipient.
    fn encrypt_attachment(
        &self,
        data: &[u8],
        recipient: &PgpKey,
        sign: bool,
    ) -> CryptoResult<Ciphertext> {
        self.encrypt(data, std::slice::from_ref(recipient), sign)?
            .pop()
            .ok_or(CryptoError::NoRecipients)
    }

    /// Wraps an existing session key for another recipient.
    fn encrypt_key_packet(
        &self,
        session_key: &SessionKey,
        recipient: &PgpKey,
    ) -> CryptoResult<Vec<u8>> {
        Ok(encrypt_session_key(session_key, recipient)?)
    }

    fn encrypt_key_packet_with_password(
        &self,
        session_key: &SessionKey,
        password: &Passphrase,
    ) -> CryptoResult<Vec<u8>> {
        Ok(encrypt_session_key_with_password(session_key, password)?)
    }

    /// Best-effort introspection of an armored key. Never fails.
    fn derive_key_info(&self, armored_key: &str) -> KeyInformation {
        KeyInformation::from_armored(armored_key, Utc::now())
    }
}

fn open(
    resolver: &KeyResolver,
    key_packet: &[u8],
    data_packet: &[u8],
    verifiers: Option<&KeyRing>,
    at: DateTime<Utc>,
) -> CryptoResult<BinaryDecryptionResult> {
    let session_key = resolver.session_key(key_packet)?;
    let no_verifiers = KeyRing::new();

    match decrypt_data(data_packet, &session_key, verifiers.unwrap_or(&no_verifiers), at) {
        Ok(decrypted) => Ok(DecryptionResult::new(decrypted.data, decrypted.verification)),
        Err(e) if verifiers.is_some() => {
            warn!("data packet failed to authenticate, reporting invalid signature: {e}");
            Ok(DecryptionResult::new(Vec::new(), Verification::Invalid))
        }
        Err(e) => Err(e.into()),
    }
}

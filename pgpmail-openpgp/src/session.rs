//! Wrapping and unwrapping session keys in key packets.
//!
//! The data packet of a message is encrypted once; every additional reader
//! only needs the session key wrapped for them in a separate key packet.

use std::time::SystemTime;

use sequoia_openpgp as openpgp;
use openpgp::crypto::S2K;
use openpgp::packet::pkesk::PKESK3;
use openpgp::packet::skesk::SKESK4;
use openpgp::packet::{PKESK, SKESK};
use openpgp::parse::Parse;
use openpgp::serialize::SerializeInto;
use openpgp::{Packet, PacketPile};
use tracing::debug;

use crate::error::{PgpError, PgpResult};
use crate::key::{PgpKey, UnlockedKey};
use crate::secret::{Passphrase, SessionKey};

/// Wraps `session_key` for `recipient`, returning a binary PKESK packet.
pub fn encrypt_session_key(session_key: &SessionKey, recipient: &PgpKey) -> PgpResult<Vec<u8>> {
    let encryption_key = recipient.encryption_key(SystemTime::now())?;
    let pkesk = PKESK3::for_recipient(session_key.algorithm(), session_key.inner(), &encryption_key)
        .map_err(|e| PgpError::Encryption(format!("wrapping session key: {e}")))?;

    Packet::from(PKESK::from(pkesk))
        .to_vec()
        .map_err(|e| PgpError::Encryption(format!("serializing key packet: {e}")))
}

/// Wraps `session_key` under a password, returning a binary SKESK packet.
pub fn encrypt_session_key_with_password(
    session_key: &SessionKey,
    password: &Passphrase,
) -> PgpResult<Vec<u8>> {
    let skesk = SKESK4::with_password(
        session_key.algorithm(),
        session_key.algorithm(),
        S2K::default(),
        session_key.inner(),
        &password.to_password(),
    )
    .map_err(|e| PgpError::Encryption(format!("wrapping session key: {e}")))?;

    Packet::from(SKESK::from(skesk))
        .to_vec()
        .map_err(|e| PgpError::Encryption(format!("serializing key packet: {e}")))
}

fn key_packets(key_packet: &[u8]) -> Vec<Packet> {
    match PacketPile::from_bytes(key_packet) {
        Ok(pile) => pile.into_children().collect(),
        Err(e) => {
            debug!("unparseable key packet: {e}");
            Vec::new()
        }
    }
}

/// Recovers the session key from `key_packet` with one unlocked key.
///
/// `None` means this key is not a recipient of the message.
pub fn decrypt_session_key(key_packet: &[u8], key: &UnlockedKey) -> Option<SessionKey> {
    for packet in key_packets(key_packet) {
        let Packet::PKESK(pkesk) = packet else {
            continue;
        };
        let recipient = pkesk.recipient();

        for secret in key.secrets() {
            if !recipient.is_wildcard() && *recipient != secret.keyid() {
                continue;
            }
            let Ok(mut keypair) = secret.clone().into_keypair() else {
                continue;
            };
            if let Some((algo, session_key)) = pkesk.decrypt(&mut keypair, None) {
                match SessionKey::from_parts(algo, session_key) {
                    Ok(session_key) => return Some(session_key),
                    Err(e) => debug!("skipping key packet for {}: {e}", secret.fingerprint()),
                }
            }
        }
    }
    None
}

/// Recovers the session key from a password-protected key packet.
pub fn decrypt_session_key_with_password(
    key_packet: &[u8],
    password: &Passphrase,
) -> Option<SessionKey> {
    let password = password.to_password();
    for packet in key_packets(key_packet) {
        let Packet::SKESK(skesk) = packet else {
            continue;
        };
        if let Ok((algo, session_key)) = skesk.decrypt(&password) {
            if let Ok(session_key) = SessionKey::from_parts(algo, session_key) {
                return Some(session_key);
            }
        }
    }
    None
}

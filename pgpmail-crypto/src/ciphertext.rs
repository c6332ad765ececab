//! Ciphertext envelope holding either armored text or split packets.

use std::cell::OnceCell;

use pgpmail_openpgp::{armor_message, dearmor_message, join_message, split_message, PgpError};

use crate::error::CryptoResult;

/// An encrypted message in armored form, split form, or both.
///
/// Whichever form the envelope was built from is kept as-is; the other is
/// derived on first access and cached, so each conversion runs at most once.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    armored: OnceCell<String>,
    packets: OnceCell<(Vec<u8>, Vec<u8>)>,
}

impl Ciphertext {
    pub fn from_armored(armored: impl Into<String>) -> Self {
        Self {
            armored: OnceCell::from(armored.into()),
            packets: OnceCell::new(),
        }
    }

    pub fn from_packets(key_packet: Vec<u8>, data_packet: Vec<u8>) -> Self {
        Self {
            armored: OnceCell::new(),
            packets: OnceCell::from((key_packet, data_packet)),
        }
    }

    /// Armored `PGP MESSAGE` block of key packet followed by data packet.
    pub fn armored(&self) -> CryptoResult<&str> {
        if let Some(armored) = self.armored.get() {
            return Ok(armored);
        }
        let (key_packet, data_packet) = self.packets()?;
        let armored = armor_message(&join_message(key_packet, data_packet))?;
        Ok(self.armored.get_or_init(|| armored))
    }

    pub fn key_packet(&self) -> CryptoResult<&[u8]> {
        Ok(&self.packets()?.0)
    }

    pub fn data_packet(&self) -> CryptoResult<&[u8]> {
        Ok(&self.packets()?.1)
    }

    fn packets(&self) -> CryptoResult<&(Vec<u8>, Vec<u8>)> {
        if let Some(packets) = self.packets.get() {
            return Ok(packets);
        }
        // Constructors always fill one of the two cells.
        let armored = self
            .armored
            .get()
            .ok_or_else(|| PgpError::MalformedMessage("empty ciphertext".to_string()))?;
        let packets = split_message(&dearmor_message(armored)?)?;
        Ok(self.packets.get_or_init(|| packets))
    }
}

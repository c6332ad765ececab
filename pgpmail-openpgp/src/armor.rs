//! ASCII armor for OpenPGP messages and signatures.

use std::io::{Read, Write};

use sequoia_openpgp as openpgp;
use openpgp::armor::{Kind, Reader, ReaderMode, Writer};

use crate::error::{PgpError, PgpResult};

fn armor(bytes: &[u8], kind: Kind) -> PgpResult<String> {
    let mut buf = Vec::new();
    let mut writer = Writer::new(&mut buf, kind)
        .map_err(|e| PgpError::Armor(format!("armor writer failed: {e}")))?;
    writer.write_all(bytes)?;
    writer
        .finalize()
        .map_err(|e| PgpError::Armor(format!("armor finalize failed: {e}")))?;
    String::from_utf8(buf).map_err(|e| PgpError::Armor(format!("armor is not UTF-8: {e}")))
}

fn dearmor(armored: &str, kind: Kind) -> PgpResult<Vec<u8>> {
    if !armored.contains("-----BEGIN PGP ") {
        return Err(PgpError::Armor("missing armor header line".to_string()));
    }
    let mut reader = Reader::from_bytes(armored.as_bytes(), ReaderMode::Tolerant(Some(kind)));
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| PgpError::Armor(format!("dearmor failed: {e}")))?;
    if bytes.is_empty() {
        return Err(PgpError::Armor("armored block is empty".to_string()));
    }
    Ok(bytes)
}

/// Armors a binary packet stream as a `PGP MESSAGE` block.
///
/// The output is a pure function of the input bytes.
pub fn armor_message(packets: &[u8]) -> PgpResult<String> {
    armor(packets, Kind::Message)
}

/// Strips the armor from a `PGP MESSAGE` block.
pub fn dearmor_message(armored: &str) -> PgpResult<Vec<u8>> {
    dearmor(armored, Kind::Message)
}

/// Armors a binary signature as a `PGP SIGNATURE` block.
pub fn armor_signature(signature: &[u8]) -> PgpResult<String> {
    armor(signature, Kind::Signature)
}

/// Strips the armor from a `PGP SIGNATURE` block.
pub fn dearmor_signature(armored: &str) -> PgpResult<Vec<u8>> {
    dearmor(armored, Kind::Signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn armor_has_message_header_and_footer() {
        let armored = armor_message(b"\xc1\x03abc").unwrap();
        assert!(armored.starts_with("-----BEGIN PGP MESSAGE-----"));
        assert!(armored.trim_end().ends_with("-----END PGP MESSAGE-----"));
    }

    #[test]
    fn armor_is_deterministic() {
        let packets = vec![0xd2u8; 500];
        assert_eq!(armor_message(&packets).unwrap(), armor_message(&packets).unwrap());
    }

    #[test]
    fn dearmor_reverses_armor() {
        let packets: Vec<u8> = (0..=255).collect();
        let armored = armor_message(&packets).unwrap();
        assert_eq!(dearmor_message(&armored).unwrap(), packets);
    }

    #[test]
    fn signature_kind_round_trips() {
        let armored = armor_signature(b"\xc2\x01x").unwrap();
        assert!(armored.starts_with("-----BEGIN PGP SIGNATURE-----"));
        assert_eq!(dearmor_signature(&armored).unwrap(), b"\xc2\x01x");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(dearmor_message("not an armored message").is_err());
    }
}

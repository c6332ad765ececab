//! Splitting hybrid-encrypted messages into key and data packets.
//!
//! A message produced for one or more recipients is a run of encrypted
//! session key packets (PKESK, tag 1, or SKESK, tag 3) followed by exactly
//! one encrypted data container (SED 9, SEIP 18 or AEAD 20). The split works
//! on packet headers only, so concatenating the two halves always gives back
//! the original bytes.

use crate::error::{PgpError, PgpResult};

const TAG_PKESK: u8 = 1;
const TAG_SKESK: u8 = 3;
const TAG_SED: u8 = 9;
const TAG_SEIP: u8 = 18;
const TAG_AEAD: u8 = 20;

/// Header of one OpenPGP packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Header {
    tag: u8,
    header_len: usize,
    /// `None` for partial or indeterminate body lengths.
    body_len: Option<usize>,
}

fn parse_header(bytes: &[u8]) -> PgpResult<Header> {
    let truncated = || PgpError::MalformedMessage("truncated packet header".to_string());

    let ctb = *bytes.first().ok_or_else(truncated)?;
    if ctb & 0x80 == 0 {
        return Err(PgpError::MalformedMessage(format!(
            "invalid packet tag byte {ctb:#04x}"
        )));
    }

    if ctb & 0x40 != 0 {
        // New format.
        let tag = ctb & 0x3f;
        let first = *bytes.get(1).ok_or_else(truncated)? as usize;
        let (header_len, body_len) = match first {
            0..=191 => (2, Some(first)),
            192..=223 => {
                let second = *bytes.get(2).ok_or_else(truncated)? as usize;
                (3, Some(((first - 192) << 8) + second + 192))
            }
            255 => {
                let len = bytes.get(2..6).ok_or_else(truncated)?;
                (6, Some(u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize))
            }
            _ => (2, None),
        };
        Ok(Header { tag, header_len, body_len })
    } else {
        // Old format.
        let tag = (ctb >> 2) & 0x0f;
        let (header_len, body_len) = match ctb & 0x03 {
            0 => (2, Some(*bytes.get(1).ok_or_else(truncated)? as usize)),
            1 => {
                let len = bytes.get(1..3).ok_or_else(truncated)?;
                (3, Some(u16::from_be_bytes([len[0], len[1]]) as usize))
            }
            2 => {
                let len = bytes.get(1..5).ok_or_else(truncated)?;
                (5, Some(u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize))
            }
            _ => (1, None),
        };
        Ok(Header { tag, header_len, body_len })
    }
}

/// Splits a binary message into `(key_packet, data_packet)`.
///
/// The key packet holds every leading session key packet; the data packet
/// is everything from the encrypted container on.
pub fn split_message(message: &[u8]) -> PgpResult<(Vec<u8>, Vec<u8>)> {
    let mut offset = 0;

    while offset < message.len() {
        let header = parse_header(&message[offset..])?;
        if header.tag != TAG_PKESK && header.tag != TAG_SKESK {
            break;
        }
        let body_len = header.body_len.ok_or_else(|| {
            PgpError::MalformedMessage("session key packet with streamed length".to_string())
        })?;
        offset = offset
            .checked_add(header.header_len)
            .and_then(|end| end.checked_add(body_len))
            .filter(|&end| end <= message.len())
            .ok_or_else(|| {
                PgpError::MalformedMessage(
                    "session key packet runs past end of message".to_string(),
                )
            })?;
    }

    if offset == 0 {
        return Err(PgpError::MalformedMessage(
            "message has no key packet".to_string(),
        ));
    }
    let rest = &message[offset..];
    if rest.is_empty() {
        return Err(PgpError::MalformedMessage(
            "message has no data packet".to_string(),
        ));
    }
    let data_tag = parse_header(rest)?.tag;
    if !matches!(data_tag, TAG_SED | TAG_SEIP | TAG_AEAD) {
        return Err(PgpError::MalformedMessage(format!(
            "expected encrypted data packet, found tag {data_tag}"
        )));
    }

    Ok((message[..offset].to_vec(), rest.to_vec()))
}

/// Joins a key packet and a data packet back into one binary message.
pub fn join_message(key_packet: &[u8], data_packet: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(key_packet.len() + data_packet.len());
    message.extend_from_slice(key_packet);
    message.extend_from_slice(data_packet);
    message
}

mod support;

use pgpmail_crypto::{Ciphertext, Crypto, UserCrypto};
use pretty_assertions::assert_eq;
use support::*;

#[test]
fn encrypted_message_survives_armor_round_trip() {
    let (record, public) = legacy_key("k1", MAILBOX_PASSPHRASE);
    let crypto = UserCrypto::new(user_with_keys(vec![record]), mailbox()).unwrap();
    let original = crypto.encrypt(b"envelope", &[public], false).unwrap().remove(0);

    let armored = original.armored().unwrap().to_string();
    let reparsed = Ciphertext::from_armored(armored.clone());

    assert_eq!(reparsed.key_packet().unwrap(), original.key_packet().unwrap());
    assert_eq!(reparsed.data_packet().unwrap(), original.data_packet().unwrap());
    assert_eq!(reparsed.armored().unwrap(), armored);
    assert_eq!(crypto.decrypt(&reparsed).unwrap().data(), "envelope");
}

#[test]
fn armored_input_is_returned_verbatim() {
    let (_, public) = legacy_key("k1", MAILBOX_PASSPHRASE);
    let armored = armored_to(b"verbatim", &public);
    let ciphertext = Ciphertext::from_armored(armored.clone());

    ciphertext.key_packet().unwrap();
    assert_eq!(ciphertext.armored().unwrap(), armored);
}

#[test]
fn garbage_armor_fails_on_packet_access() {
    let ciphertext = Ciphertext::from_armored("hello");
    assert!(ciphertext.key_packet().is_err());
    assert_eq!(ciphertext.armored().unwrap(), "hello");
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn packet(tag: u8, body: &[u8]) -> Vec<u8> {
        let mut packet = vec![0xc0 | tag, 0xff];
        packet.extend_from_slice(&(body.len() as u32).to_be_bytes());
        packet.extend_from_slice(body);
        packet
    }

    proptest! {
        #[test]
        fn packets_survive_armor_and_resplit(
            key_bodies in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..300), 1..4),
            data_body in proptest::collection::vec(any::<u8>(), 0..2048),
        ) {
            let key_packet: Vec<u8> = key_bodies.iter().flat_map(|b| packet(1, b)).collect();
            let data_packet = packet(18, &data_body);

            let armored = Ciphertext::from_packets(key_packet.clone(), data_packet.clone())
                .armored()
                .unwrap()
                .to_string();
            let resplit = Ciphertext::from_armored(armored.clone());

            prop_assert_eq!(resplit.key_packet().unwrap(), key_packet.as_slice());
            prop_assert_eq!(resplit.data_packet().unwrap(), data_packet.as_slice());
            let rebuilt = Ciphertext::from_packets(key_packet, data_packet);
            prop_assert_eq!(
                rebuilt.armored().unwrap(),
                armored.as_str()
            );
        }
    }
}

//! OpenPGP engine for pgpmail.
//!
//! A thin layer over sequoia-openpgp exposing exactly the primitives the
//! mail crypto core needs:
//! - Key parsing, status and generation
//! - Passphrase unlocking that yields `None` instead of an error on failure
//! - Hybrid messages split into a key packet and a data packet
//! - Session key wrapping for additional recipients or a password
//! - Detached signatures and a closed verification status
//!
//! # Messages
//!
//! A message for one recipient is a key packet (the session key wrapped to
//! the recipient's encryption subkey) followed by a data packet (the payload
//! encrypted with the session key). Because the two halves are independent,
//! the same data packet can be delivered to many recipients with one key
//! packet each.
//!
//! Every operation evaluates keys and signatures under sequoia's standard
//! policy.

mod armor;
mod error;
mod helper;
mod key;
mod message;
mod packets;
mod secret;
mod session;
mod signature;

use sequoia_openpgp::policy::{Policy, StandardPolicy};

pub use armor::{armor_message, armor_signature, dearmor_message, dearmor_signature};
pub use error::{PgpError, PgpResult};
pub use key::{
    generate_key, generate_key_with, KeyAlgorithm, KeyGenerationParams, KeyRing, KeyStatus,
    PgpKey, UnlockedKey,
};
pub use message::{
    decrypt_data, decrypt_with_password, encrypt_message, encrypt_with_password,
    DecryptedData, EncryptedMessage,
};
pub use packets::{join_message, split_message};
pub use secret::{Cipher, Passphrase, SessionKey};
pub use session::{
    decrypt_session_key, decrypt_session_key_with_password, encrypt_session_key,
    encrypt_session_key_with_password,
};
pub use signature::{sign_detached, verify_detached, Verification};

static POLICY: StandardPolicy<'static> = StandardPolicy::new();

pub(crate) fn policy() -> &'static dyn Policy {
    &POLICY
}

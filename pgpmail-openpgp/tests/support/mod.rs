//! Shared fixtures for engine integration tests.

use pgpmail_openpgp::{generate_key, KeyAlgorithm, Passphrase, PgpKey};

pub const PASSPHRASE: &str = "correct horse battery staple";

pub fn passphrase() -> Passphrase {
    Passphrase::from(PASSPHRASE)
}

/// Fresh Curve25519 key locked with [`PASSPHRASE`].
pub fn test_key(user_id: &str) -> PgpKey {
    generate_key(user_id, &passphrase(), KeyAlgorithm::Curve25519)
        .expect("key generation must succeed")
}

//! Decryption outcomes.

use chrono::{DateTime, Utc};
use pgpmail_openpgp::Verification;

use crate::error::{CryptoError, CryptoResult};

/// Decrypted payload together with the status of its signatures.
///
/// The status is a closed [`Verification`] value, so an unsigned result can
/// never claim a valid signature and only a valid one carries a timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptionResult<T> {
    data: T,
    verification: Verification,
}

pub type TextDecryptionResult = DecryptionResult<String>;
pub type BinaryDecryptionResult = DecryptionResult<Vec<u8>>;

impl<T> DecryptionResult<T> {
    pub fn new(data: T, verification: Verification) -> Self {
        Self { data, verification }
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_data(self) -> T {
        self.data
    }

    pub fn verification(&self) -> Verification {
        self.verification
    }

    pub fn has_signature(&self) -> bool {
        self.verification.has_signature()
    }

    pub fn is_signature_valid(&self) -> bool {
        self.verification.is_valid()
    }

    /// Creation time of the valid signature, if any.
    pub fn signed_at(&self) -> Option<DateTime<Utc>> {
        self.verification.signed_at()
    }
}

impl BinaryDecryptionResult {
    pub fn into_text(self) -> CryptoResult<TextDecryptionResult> {
        let data = String::from_utf8(self.data).map_err(|_| CryptoError::InvalidUtf8)?;
        Ok(DecryptionResult::new(data, self.verification))
    }
}

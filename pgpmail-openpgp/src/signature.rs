//! Detached signatures and signature verification status.

use std::io::Write;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use sequoia_openpgp as openpgp;
use openpgp::armor::Kind;
use openpgp::parse::stream::{
    DetachedVerifierBuilder, MessageLayer, MessageStructure, VerificationError,
    VerificationResult,
};
use openpgp::parse::Parse;
use openpgp::serialize::stream::{Armorer, Message, Signer};

use crate::armor::dearmor_signature;
use crate::error::{PgpError, PgpResult};
use crate::helper::Helper;
use crate::key::{KeyRing, UnlockedKey};
use crate::policy;

/// Outcome of checking the signatures on a message or detached signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verification {
    /// Nothing was signed.
    NoSignature,
    /// A signature verified against one of the verifier keys.
    Valid {
        /// Creation time of the signature, not the time of the check.
        signed_at: DateTime<Utc>,
    },
    /// A verifier key made the signature but it does not verify.
    Invalid,
    /// Signatures exist but none could be checked.
    Failed,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid { .. })
    }

    pub fn has_signature(&self) -> bool {
        !matches!(self, Verification::NoSignature)
    }

    pub fn signed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Verification::Valid { signed_at } => Some(*signed_at),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Verification::NoSignature => 0,
            Verification::Failed => 1,
            Verification::Invalid => 2,
            Verification::Valid { .. } => 3,
        }
    }

    /// Keeps the more conclusive of two outcomes; ties keep `self`.
    fn strongest(self, other: Verification) -> Verification {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    fn from_result(result: &VerificationResult<'_>) -> Verification {
        match result {
            Ok(good) => match good.sig.signature_creation_time() {
                Some(created) => Verification::Valid {
                    signed_at: DateTime::<Utc>::from(created),
                },
                None => Verification::Failed,
            },
            Err(VerificationError::BadSignature { .. }) | Err(VerificationError::BadKey { .. }) => {
                Verification::Invalid
            }
            Err(_) => Verification::Failed,
        }
    }

    pub(crate) fn from_structure(structure: MessageStructure<'_>) -> Verification {
        let mut outcome = Verification::NoSignature;
        for layer in structure.into_iter() {
            if let MessageLayer::SignatureGroup { results } = layer {
                for result in &results {
                    outcome = outcome.strongest(Verification::from_result(result));
                }
            }
        }
        outcome
    }
}

/// Creates an armored detached signature over `data`.
pub fn sign_detached(data: &[u8], key: &UnlockedKey) -> PgpResult<String> {
    let keypair = key.signing_keypair(SystemTime::now())?;

    let mut sink = Vec::new();
    {
        let message = Message::new(&mut sink);
        let message = Armorer::new(message)
            .kind(Kind::Signature)
            .build()
            .map_err(|e| PgpError::Signing(format!("armorer build failed: {e}")))?;
        let mut signer = Signer::new(message, keypair)
            .detached()
            .build()
            .map_err(|e| PgpError::Signing(format!("signer build failed: {e}")))?;
        signer.write_all(data)?;
        signer
            .finalize()
            .map_err(|e| PgpError::Signing(format!("signer finalize failed: {e}")))?;
    }

    String::from_utf8(sink).map_err(|e| PgpError::Armor(e.to_string()))
}

/// Checks an armored detached signature against `verifiers` at `at`.
///
/// A signature that does not verify is reported through the returned
/// [`Verification`]; only unparseable input is an error.
pub fn verify_detached(
    data: &[u8],
    signature: &str,
    verifiers: &KeyRing,
    at: DateTime<Utc>,
) -> PgpResult<Verification> {
    let signature = dearmor_signature(signature)?;
    let helper = Helper::verifying(verifiers);

    let mut verifier = DetachedVerifierBuilder::from_bytes(&signature)
        .map_err(|e| PgpError::Verification(format!("malformed signature: {e}")))?
        .with_policy(policy(), SystemTime::from(at), helper)
        .map_err(|e| PgpError::Verification(e.to_string()))?;
    verifier
        .verify_bytes(data)
        .map_err(|e| PgpError::Verification(e.to_string()))?;

    Ok(verifier.into_helper().verification())
}

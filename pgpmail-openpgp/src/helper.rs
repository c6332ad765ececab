//! Streaming decryptor/verifier callbacks.

use sequoia_openpgp as openpgp;
use openpgp::crypto::Password;
use openpgp::packet::{PKESK, SKESK};
use openpgp::parse::stream::{
    DecryptionHelper, MessageStructure, VerificationHelper,
};
use openpgp::types::SymmetricAlgorithm;
use openpgp::{Cert, Fingerprint, KeyHandle};

use crate::key::KeyRing;
use crate::secret::SessionKey;
use crate::signature::Verification;

/// Supplies session keys and verifier certificates, and records the
/// verification outcome instead of aborting on bad signatures.
pub(crate) struct Helper<'a> {
    session_key: Option<&'a SessionKey>,
    password: Option<Password>,
    verifiers: Vec<Cert>,
    verification: Verification,
}

impl<'a> Helper<'a> {
    pub(crate) fn verifying(verifiers: &KeyRing) -> Self {
        Self {
            session_key: None,
            password: None,
            verifiers: verifiers.certs(),
            verification: Verification::NoSignature,
        }
    }

    pub(crate) fn with_session_key(session_key: &'a SessionKey, verifiers: &KeyRing) -> Self {
        Self {
            session_key: Some(session_key),
            ..Self::verifying(verifiers)
        }
    }

    pub(crate) fn with_password(password: Password) -> Self {
        Self {
            password: Some(password),
            ..Self::verifying(&KeyRing::new())
        }
    }

    pub(crate) fn verification(&self) -> Verification {
        self.verification
    }
}

impl VerificationHelper for Helper<'_> {
    fn get_certs(&mut self, _ids: &[KeyHandle]) -> openpgp::Result<Vec<Cert>> {
        Ok(self.verifiers.clone())
    }

    fn check(&mut self, structure: MessageStructure) -> openpgp::Result<()> {
        // Signature validity is reported, never enforced here.
        self.verification = Verification::from_structure(structure);
        Ok(())
    }
}

impl DecryptionHelper for Helper<'_> {
    fn decrypt<D>(
        &mut self,
        _pkesks: &[PKESK],
        skesks: &[SKESK],
        _sym_algo: Option<SymmetricAlgorithm>,
        mut decrypt: D,
    ) -> openpgp::Result<Option<Fingerprint>>
    where
        D: FnMut(SymmetricAlgorithm, &openpgp::crypto::SessionKey) -> bool,
    {
        if let Some(session_key) = self.session_key {
            if decrypt(session_key.algorithm(), session_key.inner()) {
                return Ok(None);
            }
        }

        if let Some(password) = &self.password {
            for skesk in skesks {
                if let Ok((algo, session_key)) = skesk.decrypt(password) {
                    if decrypt(algo, &session_key) {
                        return Ok(None);
                    }
                }
            }
        }

        Err(anyhow::anyhow!("no session key opens the data packet"))
    }
}

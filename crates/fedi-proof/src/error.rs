//! Errors raised while creating or verifying Object Integrity Proofs and
//! legacy Linked Data Signatures.

use fedi_error::{ErrorCode, FediError};

/// Errors raised by this crate's proof/signature operations.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    /// The document already carries a `proof` (or `signature`) node that
    /// isn't shaped as this crate expects (object or array of objects).
    #[error("malformed proof node: {reason}")]
    MalformedProof {
        /// Parser failure detail.
        reason: String,
    },

    /// Signing was asked of an algorithm this proof type doesn't support
    /// (`eddsa-jcs-2022` requires Ed25519; legacy LD Signatures require
    /// RSA).
    #[error("{cryptosuite} requires a {expected} key")]
    WrongKeyAlgorithm {
        /// The cryptosuite/signature type being produced.
        cryptosuite: &'static str,
        /// The algorithm it requires.
        expected: &'static str,
    },

    /// Fetching the `verificationMethod`'s key document failed.
    #[error("failed to fetch verification method: {0}")]
    KeyFetch(#[from] fedi_loader::error::LoaderError),

    /// The fetched verification method didn't decode to a recognized key
    /// type for this proof kind.
    #[error("verification method at {url:?} is not a recognized key type: {reason}")]
    MalformedVerificationMethod {
        /// The `verificationMethod`/`creator` URL.
        url: String,
        /// Why decoding failed.
        reason: String,
    },

    /// The underlying RSA signer rejected the signing input.
    #[error("signing failed: {0}")]
    SignFailed(#[from] fedi_crypto::CryptoError),
}

impl From<ProofError> for FediError {
    fn from(err: ProofError) -> Self {
        let code = match &err {
            ProofError::MalformedProof { .. } => ErrorCode::VerificationMissing,
            ProofError::WrongKeyAlgorithm { .. } => ErrorCode::CryptoUnsupportedAlgorithm,
            ProofError::KeyFetch(_) | ProofError::MalformedVerificationMethod { .. } => {
                ErrorCode::VerificationKeyNotOwned
            }
            ProofError::SignFailed(_) => ErrorCode::CryptoSignFailed,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

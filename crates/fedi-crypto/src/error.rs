//! Errors raised by key generation, import/export, and signing.

use fedi_error::{ErrorCode, FediError};

/// Errors raised by this crate's key-handling operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The key algorithm named in a request is not RSA or Ed25519.
    #[error("unsupported key algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// The offending algorithm name or OID.
        algorithm: String,
    },

    /// An RSA key used a digest other than SHA-256.
    #[error("unsupported RSA digest: {digest}")]
    UnsupportedDigest {
        /// The offending digest name.
        digest: String,
    },

    /// PEM, SPKI DER, JWK, or multibase parsing failed.
    #[error("malformed key ({format}): {reason}")]
    MalformedKey {
        /// The encoding being parsed (`"spki-pem"`, `"jwk"`, `"multibase"`).
        format: &'static str,
        /// Parser failure detail.
        reason: String,
    },

    /// Key generation or signing failed inside the underlying crypto crate.
    #[error("signing operation failed: {reason}")]
    SignFailed {
        /// Underlying failure detail.
        reason: String,
    },
}

impl From<CryptoError> for FediError {
    fn from(err: CryptoError) -> Self {
        let code = match &err {
            CryptoError::UnsupportedAlgorithm { .. } => ErrorCode::CryptoUnsupportedAlgorithm,
            CryptoError::UnsupportedDigest { .. } => ErrorCode::CryptoUnsupportedDigest,
            CryptoError::MalformedKey { .. } => ErrorCode::CryptoMalformedKey,
            CryptoError::SignFailed { .. } => ErrorCode::CryptoSignFailed,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_algorithm_maps_to_its_code() {
        let err = CryptoError::UnsupportedAlgorithm { algorithm: "dsa".into() };
        let fedi_err: FediError = err.into();
        assert_eq!(fedi_err.code, ErrorCode::CryptoUnsupportedAlgorithm);
    }

    #[test]
    fn malformed_key_maps_to_its_code() {
        let err = CryptoError::MalformedKey { format: "jwk", reason: "missing kty".into() };
        let fedi_err: FediError = err.into();
        assert_eq!(fedi_err.code, ErrorCode::CryptoMalformedKey);
    }
}

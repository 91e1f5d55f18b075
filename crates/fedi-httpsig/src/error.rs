//! HTTP Signature errors.

use fedi_error::{ErrorCode, FediError};

/// Errors raised while signing or verifying a `Signature` header.
#[derive(Debug, thiserror::Error)]
pub enum HttpSigError {
    /// Signing was asked of a non-RSA key; draft-cavage `rsa-sha256` is the
    /// only algorithm this framework signs with.
    #[error("HTTP Signatures require an RSA key, got {algorithm:?}")]
    UnsupportedAlgorithm {
        /// The algorithm of the key that was supplied.
        algorithm: &'static str,
    },

    /// The `Signature` header was missing or didn't parse into its named
    /// components.
    #[error("malformed Signature header: {0}")]
    MalformedHeader(String),

    /// A header named in the signed header set was itself missing from the
    /// request.
    #[error("signed header set references missing header {0:?}")]
    MissingSignedHeader(String),

    /// The `Date` header fell outside the allowed clock-skew window.
    #[error("Date header {date:?} is outside the {window_secs}s verification window")]
    ClockSkew {
        /// The offending `Date` header value.
        date: String,
        /// The configured window, in seconds.
        window_secs: i64,
    },

    /// The request body's digest didn't match the `Digest` header.
    #[error("request body digest does not match Digest header")]
    DigestMismatch,

    /// Resolving the `keyId` through the document loader failed.
    #[error("failed to fetch signing key: {0}")]
    KeyFetch(#[from] fedi_loader::error::LoaderError),

    /// The fetched key document didn't decode to a `CryptographicKey` or
    /// `Multikey`.
    #[error("key document at {url:?} is not a recognized key type: {reason}")]
    MalformedKeyDocument {
        /// The `keyId` URL.
        url: String,
        /// Why decoding failed.
        reason: String,
    },
}

impl From<HttpSigError> for FediError {
    fn from(err: HttpSigError) -> Self {
        let code = match &err {
            HttpSigError::UnsupportedAlgorithm { .. } => ErrorCode::CryptoUnsupportedAlgorithm,
            HttpSigError::MalformedHeader(_) | HttpSigError::MissingSignedHeader(_) => {
                ErrorCode::VerificationMissing
            }
            HttpSigError::ClockSkew { .. } => ErrorCode::VerificationClockSkew,
            HttpSigError::DigestMismatch => ErrorCode::VerificationDigestMismatch,
            HttpSigError::KeyFetch(_) | HttpSigError::MalformedKeyDocument { .. } => {
                ErrorCode::VerificationKeyNotOwned
            }
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

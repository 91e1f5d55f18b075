//! Unified error taxonomy with stable error codes for the federation framework.
//!
//! Every [`FediError`] carries an [`ErrorCode`] (a machine-readable, stable
//! string tag), a human-readable message, an optional cause chain, and
//! arbitrary key-value context. Use the builder returned by
//! [`FediError::new`] to construct errors fluently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
///
/// Mirrors the error-handling design in the specification: each category
/// maps to one of the propagation policies (retry, fatal, recoverable-to-None).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// JSON-LD decode / encode errors.
    Codec,
    /// Key import/export and signing/verification errors.
    Crypto,
    /// DNS, connection, or timeout failures while fetching over the network.
    Network,
    /// A fetch target violates the SSRF / private-address policy.
    UrlPolicy,
    /// HTTP Signature, LD Signature, or Integrity Proof verification failure.
    Verification,
    /// An application-registered dispatcher or listener raised an error.
    Dispatch,
    /// Outbound delivery queue errors (exhaustion, malformed job).
    Queue,
    /// WebFinger resolution errors.
    WebFinger,
    /// Router registration or matching errors.
    Router,
    /// Collection pagination errors.
    Collection,
    /// Configuration errors.
    Config,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Codec => "codec",
            Self::Crypto => "crypto",
            Self::Network => "network",
            Self::UrlPolicy => "url_policy",
            Self::Verification => "verification",
            Self::Dispatch => "dispatch",
            Self::Queue => "queue",
            Self::WebFinger => "webfinger",
            Self::Router => "router",
            Self::Collection => "collection",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Codec --
    /// The document is not valid JSON-LD, or failed to expand.
    CodecMalformedDocument,
    /// A functional property was given more than one value.
    CodecFunctionalPropertyConflict,
    /// Both the singular and plural form of a property were supplied.
    CodecSingularPluralConflict,
    /// A value did not match any type in the property's declared range.
    CodecTypeMismatch,
    /// Recursion depth exceeded while expanding or encoding.
    CodecRecursionLimitExceeded,
    /// The document had no `@context` entry.
    CodecMissingContext,
    /// A context entry's IRI failed basic syntax validation.
    CodecInvalidIri,

    // -- Crypto --
    /// The key algorithm is not one of the two supported algorithms.
    CryptoUnsupportedAlgorithm,
    /// An RSA key was not SHA-256.
    CryptoUnsupportedDigest,
    /// SPKI / PEM / JWK / multibase parsing failed.
    CryptoMalformedKey,
    /// Signing failed.
    CryptoSignFailed,

    // -- Network --
    /// DNS resolution failed.
    NetworkDnsFailure,
    /// Connection was refused or reset.
    NetworkConnectFailure,
    /// The request exceeded its configured timeout.
    NetworkTimeout,

    // -- UrlPolicy --
    /// The target resolves to a private, loopback, or link-local address.
    UrlPolicyPrivateAddress,
    /// The target protocol is not permitted (e.g. downgrade from https).
    UrlPolicyProtocolDowngrade,

    // -- Verification --
    /// No `Signature` header / proof / LD signature was present.
    VerificationMissing,
    /// The signature did not verify against the published key.
    VerificationSignatureMismatch,
    /// The `Date` header fell outside the allowed clock-skew window.
    VerificationClockSkew,
    /// The `Digest` header did not match the recomputed body digest.
    VerificationDigestMismatch,
    /// The actor does not publish the key used to sign the activity.
    VerificationKeyNotOwned,

    // -- Dispatch --
    /// The registered listener raised an error while handling an activity.
    DispatchListenerFailed,
    /// No listener is registered for the activity's runtime type.
    DispatchNoListener,

    // -- Queue --
    /// The delivery job exhausted its retry policy.
    QueueRetriesExhausted,
    /// The job payload could not be (de)serialized.
    QueueMalformedJob,

    // -- WebFinger --
    /// The `resource` query parameter was missing or malformed.
    WebFingerInvalidResource,
    /// Too many redirects were followed while resolving a resource.
    WebFingerTooManyRedirects,

    // -- Router --
    /// Two templates were registered that match the same path shape.
    RouterDuplicateTemplate,
    /// No registered template matches the given path.
    RouterNoMatch,

    // -- Collection --
    /// The `authorize` predicate rejected the request.
    CollectionUnauthorized,

    // -- Config --
    /// Configuration file or value is invalid.
    ConfigInvalid,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CodecMalformedDocument
            | Self::CodecFunctionalPropertyConflict
            | Self::CodecSingularPluralConflict
            | Self::CodecTypeMismatch
            | Self::CodecRecursionLimitExceeded
            | Self::CodecMissingContext
            | Self::CodecInvalidIri => ErrorCategory::Codec,

            Self::CryptoUnsupportedAlgorithm
            | Self::CryptoUnsupportedDigest
            | Self::CryptoMalformedKey
            | Self::CryptoSignFailed => ErrorCategory::Crypto,

            Self::NetworkDnsFailure | Self::NetworkConnectFailure | Self::NetworkTimeout => {
                ErrorCategory::Network
            }

            Self::UrlPolicyPrivateAddress | Self::UrlPolicyProtocolDowngrade => {
                ErrorCategory::UrlPolicy
            }

            Self::VerificationMissing
            | Self::VerificationSignatureMismatch
            | Self::VerificationClockSkew
            | Self::VerificationDigestMismatch
            | Self::VerificationKeyNotOwned => ErrorCategory::Verification,

            Self::DispatchListenerFailed | Self::DispatchNoListener => ErrorCategory::Dispatch,

            Self::QueueRetriesExhausted | Self::QueueMalformedJob => ErrorCategory::Queue,

            Self::WebFingerInvalidResource | Self::WebFingerTooManyRedirects => {
                ErrorCategory::WebFinger
            }

            Self::RouterDuplicateTemplate | Self::RouterNoMatch => ErrorCategory::Router,

            Self::CollectionUnauthorized => ErrorCategory::Collection,

            Self::ConfigInvalid => ErrorCategory::Config,

            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation of the code (e.g.
    /// `"VERIFICATION_SIGNATURE_MISMATCH"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CodecMalformedDocument => "CODEC_MALFORMED_DOCUMENT",
            Self::CodecFunctionalPropertyConflict => "CODEC_FUNCTIONAL_PROPERTY_CONFLICT",
            Self::CodecSingularPluralConflict => "CODEC_SINGULAR_PLURAL_CONFLICT",
            Self::CodecTypeMismatch => "CODEC_TYPE_MISMATCH",
            Self::CodecRecursionLimitExceeded => "CODEC_RECURSION_LIMIT_EXCEEDED",
            Self::CodecMissingContext => "CODEC_MISSING_CONTEXT",
            Self::CodecInvalidIri => "CODEC_INVALID_IRI",
            Self::CryptoUnsupportedAlgorithm => "CRYPTO_UNSUPPORTED_ALGORITHM",
            Self::CryptoUnsupportedDigest => "CRYPTO_UNSUPPORTED_DIGEST",
            Self::CryptoMalformedKey => "CRYPTO_MALFORMED_KEY",
            Self::CryptoSignFailed => "CRYPTO_SIGN_FAILED",
            Self::NetworkDnsFailure => "NETWORK_DNS_FAILURE",
            Self::NetworkConnectFailure => "NETWORK_CONNECT_FAILURE",
            Self::NetworkTimeout => "NETWORK_TIMEOUT",
            Self::UrlPolicyPrivateAddress => "URL_POLICY_PRIVATE_ADDRESS",
            Self::UrlPolicyProtocolDowngrade => "URL_POLICY_PROTOCOL_DOWNGRADE",
            Self::VerificationMissing => "VERIFICATION_MISSING",
            Self::VerificationSignatureMismatch => "VERIFICATION_SIGNATURE_MISMATCH",
            Self::VerificationClockSkew => "VERIFICATION_CLOCK_SKEW",
            Self::VerificationDigestMismatch => "VERIFICATION_DIGEST_MISMATCH",
            Self::VerificationKeyNotOwned => "VERIFICATION_KEY_NOT_OWNED",
            Self::DispatchListenerFailed => "DISPATCH_LISTENER_FAILED",
            Self::DispatchNoListener => "DISPATCH_NO_LISTENER",
            Self::QueueRetriesExhausted => "QUEUE_RETRIES_EXHAUSTED",
            Self::QueueMalformedJob => "QUEUE_MALFORMED_JOB",
            Self::WebFingerInvalidResource => "WEBFINGER_INVALID_RESOURCE",
            Self::WebFingerTooManyRedirects => "WEBFINGER_TOO_MANY_REDIRECTS",
            Self::RouterDuplicateTemplate => "ROUTER_DUPLICATE_TEMPLATE",
            Self::RouterNoMatch => "ROUTER_NO_MATCH",
            Self::CollectionUnauthorized => "COLLECTION_UNAUTHORIZED",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FediError
// ---------------------------------------------------------------------------

/// Unified federation framework error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Builder usage
///
/// ```
/// use fedi_error::{FediError, ErrorCode};
///
/// let err = FediError::new(ErrorCode::NetworkTimeout, "timed out after 30 s")
///     .with_context("inbox", "https://example.com/users/alice/inbox")
///     .with_context("timeout_ms", 30_000);
/// ```
pub struct FediError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl FediError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

impl fmt::Debug for FediError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("FediError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for FediError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            // Deterministic output thanks to BTreeMap.
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FediError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Serialization support
// ---------------------------------------------------------------------------

/// Serialisable snapshot of a [`FediError`] (without the opaque source).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FediErrorDto {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&FediError> for FediErrorDto {
    fn from(err: &FediError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

impl From<FediErrorDto> for FediError {
    fn from(dto: FediErrorDto) -> Self {
        Self {
            code: dto.code,
            message: dto.message,
            source: None,
            context: dto.context,
        }
    }
}

/// Convenience alias for `Result<T, FediError>`.
pub type FediResult<T> = Result<T, FediError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

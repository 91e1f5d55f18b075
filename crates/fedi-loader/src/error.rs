//! Errors raised while resolving, fetching, and caching remote documents.

use fedi_error::{ErrorCode, FediError};

/// Errors raised by [`crate::loader::DocumentLoader::load`].
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// DNS resolution for the target host failed.
    #[error("DNS resolution failed for '{host}': {reason}")]
    DnsFailure {
        /// The host that failed to resolve.
        host: String,
        /// Underlying resolver error text.
        reason: String,
    },

    /// The request could not be connected, or was reset mid-flight.
    #[error("connection failed: {reason}")]
    ConnectFailure {
        /// Underlying transport error text.
        reason: String,
    },

    /// The request exceeded its configured timeout.
    #[error("request to '{url}' timed out after {timeout_ms}ms")]
    Timeout {
        /// The URL being fetched.
        url: String,
        /// The configured timeout.
        timeout_ms: u64,
    },

    /// The target host resolves to a private, loopback, or link-local
    /// address and `allow_private_address` was not set.
    #[error("refusing to fetch '{url}': resolves to a private/loopback address")]
    PrivateAddress {
        /// The URL that was rejected.
        url: String,
    },

    /// The target URL uses a scheme other than `https` (or `http` when
    /// explicitly allowed for loopback testing).
    #[error("refusing to fetch '{url}': protocol downgrade not permitted")]
    ProtocolDowngrade {
        /// The URL that was rejected.
        url: String,
    },

    /// The server returned a non-success status code.
    #[error("fetch of '{url}' returned HTTP {status}")]
    HttpStatus {
        /// The URL that was fetched.
        url: String,
        /// The response status code.
        status: u16,
    },

    /// The response body was not valid JSON.
    #[error("response body from '{url}' is not valid JSON: {reason}")]
    MalformedBody {
        /// The URL that was fetched.
        url: String,
        /// Parser failure detail.
        reason: String,
    },

    /// The URL string itself could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
        /// Parser failure detail.
        reason: String,
    },
}

impl From<LoaderError> for FediError {
    fn from(err: LoaderError) -> Self {
        let code = match &err {
            LoaderError::DnsFailure { .. } => ErrorCode::NetworkDnsFailure,
            LoaderError::ConnectFailure { .. } => ErrorCode::NetworkConnectFailure,
            LoaderError::Timeout { .. } => ErrorCode::NetworkTimeout,
            LoaderError::PrivateAddress { .. } => ErrorCode::UrlPolicyPrivateAddress,
            LoaderError::ProtocolDowngrade { .. } => ErrorCode::UrlPolicyProtocolDowngrade,
            LoaderError::HttpStatus { .. }
            | LoaderError::MalformedBody { .. }
            | LoaderError::InvalidUrl { .. } => ErrorCode::CodecMalformedDocument,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_address_maps_to_url_policy_category() {
        let err = LoaderError::PrivateAddress { url: "http://127.0.0.1/".into() };
        let fedi_err: FediError = err.into();
        assert_eq!(fedi_err.code, ErrorCode::UrlPolicyPrivateAddress);
        assert_eq!(fedi_err.category(), fedi_error::ErrorCategory::UrlPolicy);
    }

    #[test]
    fn timeout_maps_to_network_category() {
        let err = LoaderError::Timeout { url: "https://example.com".into(), timeout_ms: 5000 };
        let fedi_err: FediError = err.into();
        assert_eq!(fedi_err.code, ErrorCode::NetworkTimeout);
    }
}

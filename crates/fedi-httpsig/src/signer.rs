//! A [`fedi_loader::RequestSigner`] implementation backed by
//! [`crate::sign::sign_request`], for use by
//! `fedi_loader::authorized::AuthorizedDocumentLoader`.

use crate::sign::sign_request;
use fedi_crypto::KeyPair;
use fedi_loader::RequestSigner;
use reqwest::header::HeaderMap;
use reqwest::Url;

/// Signs every outbound request with one fixed RSA key and `keyId`.
///
/// Signing failures (only possible for a non-RSA key, which this type's
/// constructor forbids) are logged and otherwise swallowed: the
/// `RequestSigner` trait is infallible because an unsigned authorized fetch
/// should still be attempted and let the remote server's `401` surface the
/// problem, rather than the local fetch itself erroring opaquely.
pub struct HttpSignatureSigner {
    key: KeyPair,
    key_id: String,
}

impl HttpSignatureSigner {
    /// Build a signer for `key_id`, backed by `key`.
    #[must_use]
    pub fn new(key: KeyPair, key_id: impl Into<String>) -> Self {
        Self { key, key_id: key_id.into() }
    }
}

impl RequestSigner for HttpSignatureSigner {
    fn sign(&self, method: &str, url: &Url, headers: &mut HeaderMap, body: Option<&[u8]>) {
        if let Err(err) = sign_request(method, url, headers, body, &self.key, &self.key_id) {
            tracing::warn!(error = %err, "failed to sign authorized fetch request");
        }
    }
}

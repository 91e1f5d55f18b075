//! The signing boundary between this crate and `fedi-httpsig`.
//!
//! [`crate::authorized::AuthorizedDocumentLoader`] needs to attach an HTTP
//! Signature to every outbound GET, but the signature-construction logic
//! lives in `fedi-httpsig` (shared with outbound activity delivery).
//! Depending on `fedi-httpsig` directly here would create a cycle, since
//! `fedi-httpsig::verify_request` needs a [`crate::loader::DocumentLoader`]
//! to fetch the signer's public key. This trait breaks the cycle:
//! `fedi-httpsig` implements it for its own signer type, and callers wire
//! the two crates together at the composition root.
use reqwest::header::HeaderMap;
use reqwest::Url;

/// Attaches request-signing headers (`Date`, `Digest`, `Signature`, ...) to
/// an outbound request.
pub trait RequestSigner: Send + Sync {
    /// Compute and insert the headers needed to authenticate `method url`
    /// (with optional `body`) into `headers`.
    fn sign(&self, method: &str, url: &Url, headers: &mut HeaderMap, body: Option<&[u8]>);
}

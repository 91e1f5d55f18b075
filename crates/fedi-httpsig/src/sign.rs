//! `sign_request`: attach a draft-cavage `rsa-sha256` `Signature` header to
//! an outbound request.

use crate::digest::compute_digest_header;
use crate::error::HttpSigError;
use crate::signature_string::{build_signature_header, signing_string};
use base64::Engine;
use fedi_crypto::{KeyAlgorithm, KeyPair};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, DATE, HOST};
use reqwest::Url;

/// Sign `method url` (with optional `body`), inserting `Date`, `Host`,
/// `Digest` (if a body is present), and `Signature` into `headers`.
///
/// # Errors
///
/// Returns [`HttpSigError::UnsupportedAlgorithm`] if `key` isn't RSA — this
/// framework only signs HTTP Signatures with `rsa-sha256`, per the
/// draft-cavage convention federated servers interoperate on.
pub fn sign_request(
    method: &str,
    url: &Url,
    headers: &mut HeaderMap,
    body: Option<&[u8]>,
    key: &KeyPair,
    key_id: &str,
) -> Result<(), HttpSigError> {
    if key.algorithm() != KeyAlgorithm::Rsa {
        return Err(HttpSigError::UnsupportedAlgorithm { algorithm: "ed25519" });
    }

    ensure_date_header(headers);
    ensure_host_header(headers, url);

    let mut signed_headers = vec!["(request-target)".to_string(), "host".to_string(), "date".to_string()];

    if let Some(body) = body {
        let digest = compute_digest_header(body);
        headers.insert(
            HeaderName::from_static("digest"),
            HeaderValue::from_str(&digest).expect("digest header value is always valid ASCII"),
        );
        signed_headers.push("digest".to_string());
    }

    if method.eq_ignore_ascii_case("post") && headers.contains_key(CONTENT_TYPE) {
        signed_headers.push("content-type".to_string());
    }

    let path_and_query = path_and_query(url);
    let lookup = |name: &str| header_str(headers, name);
    let string_to_sign = signing_string(method, &path_and_query, &signed_headers, lookup)?;

    let signature = key.sign(string_to_sign.as_bytes()).map_err(|e| HttpSigError::MalformedKeyDocument {
        url: key_id.to_string(),
        reason: e.to_string(),
    })?;
    let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature);

    let header_value = build_signature_header(key_id, "rsa-sha256", &signed_headers, &signature_b64);
    headers.insert(
        HeaderName::from_static("signature"),
        HeaderValue::from_str(&header_value).expect("signature header value is always valid ASCII"),
    );

    Ok(())
}

fn ensure_date_header(headers: &mut HeaderMap) {
    if headers.contains_key(DATE) {
        return;
    }
    let now = chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    headers.insert(DATE, HeaderValue::from_str(&now).expect("RFC 1123 date is valid ASCII"));
}

fn ensure_host_header(headers: &mut HeaderMap, url: &Url) {
    if headers.contains_key(HOST) {
        return;
    }
    let host = match url.port() {
        Some(port) => format!("{}:{port}", url.host_str().unwrap_or_default()),
        None => url.host_str().unwrap_or_default().to_string(),
    };
    headers.insert(HOST, HeaderValue::from_str(&host).expect("URL host is valid ASCII"));
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

//! Parsing and building the draft-cavage `Signature` header, and
//! constructing the signing string it authenticates.

use crate::error::HttpSigError;

/// The parsed components of a `Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParams {
    /// The `keyId` parameter: a URL identifying the signing key.
    pub key_id: String,
    /// The `algorithm` parameter (e.g. `"rsa-sha256"`).
    pub algorithm: String,
    /// The signed header set, in signing order.
    pub headers: Vec<String>,
    /// The base64-decoded signature bytes.
    pub signature: Vec<u8>,
}

/// Parse a `Signature` header value into its named components.
///
/// # Errors
///
/// Returns [`HttpSigError::MalformedHeader`] if a required parameter
/// (`keyId`, `algorithm`, `signature`) is missing, or the `signature`
/// parameter isn't valid base64.
pub fn parse_signature_header(value: &str) -> Result<SignatureParams, HttpSigError> {
    let mut key_id = None;
    let mut algorithm = None;
    let mut headers = None;
    let mut signature = None;

    for part in split_params(value) {
        let Some((name, raw_value)) = part.split_once('=') else {
            continue;
        };
        let unquoted = raw_value.trim().trim_matches('"');
        match name.trim() {
            "keyId" => key_id = Some(unquoted.to_string()),
            "algorithm" => algorithm = Some(unquoted.to_string()),
            "headers" => headers = Some(unquoted.split(' ').map(str::to_string).collect()),
            "signature" => signature = Some(unquoted.to_string()),
            _ => {}
        }
    }

    let key_id = key_id.ok_or_else(|| HttpSigError::MalformedHeader("missing keyId".into()))?;
    let algorithm = algorithm.unwrap_or_else(|| "rsa-sha256".to_string());
    let headers: Vec<String> = headers.unwrap_or_else(|| vec!["(request-target)".to_string(), "date".to_string()]);
    let signature_b64 = signature.ok_or_else(|| HttpSigError::MalformedHeader("missing signature".into()))?;
    let signature = {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(signature_b64)
            .map_err(|e| HttpSigError::MalformedHeader(format!("invalid base64 signature: {e}")))?
    };

    Ok(SignatureParams { key_id, algorithm, headers, signature })
}

/// Split a `name=value, name=value` parameter list, tolerating commas
/// inside quoted values (the `headers` parameter never contains one, but
/// defensive splitting costs nothing).
fn split_params(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());
    parts
}

/// Build a `Signature` header value from its components.
#[must_use]
pub fn build_signature_header(key_id: &str, algorithm: &str, headers: &[String], signature_b64: &str) -> String {
    format!(
        "keyId=\"{key_id}\",algorithm=\"{algorithm}\",headers=\"{}\",signature=\"{signature_b64}\"",
        headers.join(" ")
    )
}

/// Build the signing string for the given signed-header-set, method, and
/// path+query, resolving each named header's value via `lookup`.
///
/// The pseudo-header `(request-target)` resolves to `"{method} {path}"`
/// (method lowercased) rather than through `lookup`.
///
/// # Errors
///
/// Returns [`HttpSigError::MissingSignedHeader`] if a named header (other
/// than `(request-target)`) isn't resolvable.
pub fn signing_string(
    method: &str,
    path_and_query: &str,
    header_names: &[String],
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, HttpSigError> {
    let mut lines = Vec::with_capacity(header_names.len());
    for name in header_names {
        let value = if name == "(request-target)" {
            format!("{} {path_and_query}", method.to_ascii_lowercase())
        } else {
            lookup(name).ok_or_else(|| HttpSigError::MissingSignedHeader(name.clone()))?
        };
        lines.push(format!("{name}: {value}"));
    }
    Ok(lines.join("\n"))
}

//! The inbound verification priority chain: Object Integrity Proof, then
//! legacy Linked Data Signature, then draft-cavage HTTP Signature (with an
//! actor-key-ownership check HTTP Signatures can't provide on their own).

use crate::error::InboxError;
use fedi_httpsig::VerifyOptions;
use fedi_loader::DocumentLoader;
use fedi_telemetry::VerificationMethod;
use reqwest::header::HeaderMap;
use serde_json::Value;

/// Verify an inbound activity, trying each mechanism in priority order and
/// returning the first that succeeds.
///
/// An Integrity Proof or LD Signature travels with the document and
/// authenticates it directly; an HTTP Signature only authenticates the
/// request, so it's accepted only when the signing key is also published
/// by the activity's own `actor` (checked via
/// [`fedi_httpsig::does_actor_own_key`]) — otherwise any actor could
/// relay a signed envelope while claiming someone else's identity.
///
/// # Errors
///
/// Propagates a document-loader failure distinct from "this mechanism
/// doesn't verify" (e.g. the signer's key document is unreachable).
pub async fn verify_activity(
    document: &Value,
    method: &str,
    path_and_query: &str,
    headers: &HeaderMap,
    body: &[u8],
    loader: &dyn DocumentLoader,
    options: &VerifyOptions,
) -> Result<Option<VerificationMethod>, InboxError> {
    if fedi_proof::integrity::verify_object(document, loader).await?.is_some() {
        return Ok(Some(VerificationMethod::IntegrityProof));
    }
    if fedi_proof::ld_signature::verify_object(document, loader).await?.is_some() {
        return Ok(Some(VerificationMethod::LdSignature));
    }

    if fedi_httpsig::verify_request(method, path_and_query, headers, Some(body), loader, options).await?.is_none() {
        return Ok(None);
    }

    let Some(sig_header) = headers.get("signature").and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };
    let Ok(params) = fedi_httpsig::signature_string::parse_signature_header(sig_header) else {
        return Ok(None);
    };
    let Some(actor_id) = document.get("actor").and_then(actor_id_of) else {
        return Ok(None);
    };

    if fedi_httpsig::does_actor_own_key(actor_id, &params.key_id, loader).await? {
        Ok(Some(VerificationMethod::HttpSignature))
    } else {
        Ok(None)
    }
}

fn actor_id_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.first().and_then(actor_id_of),
        Value::Object(map) => map.get("id").and_then(Value::as_str),
        _ => None,
    }
}

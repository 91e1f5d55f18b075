//! `verify_request`: validate a draft-cavage `Signature` header, and
//! `does_actor_own_key`: confirm an activity's actor publishes a given key.

use crate::digest::verify_digest_header;
use crate::error::HttpSigError;
use crate::signature_string::{parse_signature_header, signing_string};
use fedi_crypto::PublicKey;
use fedi_loader::DocumentLoader;
use fedi_vocab::{Entity, VocabError};
use reqwest::header::HeaderMap;

/// Tuning knobs for [`verify_request`].
#[derive(Debug, Clone, Copy)]
pub struct VerifyOptions {
    /// How many seconds the `Date` header may drift from the verifier's
    /// clock, in either direction, before the request is rejected as
    /// stale/future-dated.
    pub clock_skew_secs: i64,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self { clock_skew_secs: 30 }
    }
}

/// Verify a request's `Signature` header.
///
/// Returns `Ok(Some(key))` on success, `Ok(None)` for any recoverable
/// verification failure (malformed header, clock skew, digest mismatch,
/// unresolvable key, bad signature) — only a document-loader error
/// unrelated to the signature itself propagates as `Err`.
///
/// # Errors
///
/// Propagates [`HttpSigError::KeyFetch`] if the loader itself errors (e.g.
/// the target is down, not merely "no valid key there").
pub async fn verify_request(
    method: &str,
    path_and_query: &str,
    headers: &HeaderMap,
    body: Option<&[u8]>,
    loader: &dyn DocumentLoader,
    options: &VerifyOptions,
) -> Result<Option<PublicKey>, HttpSigError> {
    let Some(sig_header) = header_str(headers, "signature") else {
        return Ok(None);
    };
    let Ok(params) = parse_signature_header(&sig_header) else {
        return Ok(None);
    };

    let Some(date_str) = header_str(headers, "date") else {
        return Ok(None);
    };
    if !within_clock_skew(&date_str, options.clock_skew_secs) {
        tracing::warn!(date = %date_str, "HTTP Signature verification rejected: Date outside clock-skew window");
        return Ok(None);
    }

    if let Some(body) = body {
        if let Some(digest_header) = header_str(headers, "digest") {
            if !verify_digest_header(&digest_header, body) {
                tracing::warn!("HTTP Signature verification rejected: Digest mismatch");
                return Ok(None);
            }
        }
    }

    let lookup = |name: &str| header_str(headers, name);
    let Ok(string_to_verify) = signing_string(method, path_and_query, &params.headers, lookup) else {
        return Ok(None);
    };

    let key_entity = match fetch_key_entity(&params.key_id, loader).await {
        Ok(entity) => entity,
        Err(HttpSigError::KeyFetch(loader_err)) => return Err(HttpSigError::KeyFetch(loader_err)),
        Err(_) => return Ok(None),
    };

    let Some(public_key) = key_material(&key_entity) else {
        return Ok(None);
    };

    if public_key.verify(string_to_verify.as_bytes(), &params.signature) {
        Ok(Some(public_key))
    } else {
        Ok(None)
    }
}

/// `true` if the actor named by `actor_id` publishes `key_id` among its
/// `publicKey` or `assertionMethod` entries.
///
/// # Errors
///
/// Propagates [`HttpSigError::KeyFetch`] if fetching the actor document
/// fails.
pub async fn does_actor_own_key(actor_id: &str, key_id: &str, loader: &dyn DocumentLoader) -> Result<bool, HttpSigError> {
    let entity = fetch_key_entity(actor_id, loader).await?;
    let owns = entity
        .get_plural("publicKey")
        .iter()
        .chain(entity.get_plural("assertionMethod"))
        .any(|v| Entity::prop_id(v) == Some(key_id));
    Ok(owns)
}

async fn fetch_key_entity(url: &str, loader: &dyn DocumentLoader) -> Result<Entity, HttpSigError> {
    let anchor = Entity::new("Object");
    anchor.dereference(&serde_json::Value::String(url.to_string()), loader).await.map_err(|e| match e {
        VocabError::Dereference(loader_err) => HttpSigError::KeyFetch(loader_err),
        other => HttpSigError::MalformedKeyDocument { url: url.to_string(), reason: other.to_string() },
    })
}

fn key_material(entity: &Entity) -> Option<PublicKey> {
    if entity.is_a("CryptographicKey") {
        let pem = entity.get_str("publicKeyPem")?;
        fedi_crypto::import_spki(pem).ok()
    } else if entity.is_a("Multikey") {
        let multibase = entity.get_str("publicKeyMultibase")?;
        fedi_crypto::import_multibase_key(multibase).ok()
    } else {
        None
    }
}

fn within_clock_skew(date_header: &str, window_secs: i64) -> bool {
    let Ok(parsed) = chrono::DateTime::parse_from_rfc2822(date_header) else {
        return false;
    };
    let delta = (chrono::Utc::now() - parsed.with_timezone(&chrono::Utc)).num_seconds();
    delta.abs() <= window_secs
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

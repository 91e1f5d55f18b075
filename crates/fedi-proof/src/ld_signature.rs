//! Legacy Linked Data Signatures (`RsaSignature2017`).
//!
//! Predates the Data Integrity / FEP-8b32 proof format. Still attached by
//! some deployed servers, so the inbox pipeline falls back to verifying it
//! when a document carries a `signature` property instead of (or in
//! addition to) a `proof` property. New documents this crate signs always
//! use [`crate::integrity`]; this module is verify-and-create for
//! interop, not the preferred path.

use crate::error::ProofError;
use crate::jcs::canonicalize;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{SecondsFormat, Utc};
use fedi_crypto::{KeyAlgorithm, KeyPair, PublicKey};
use fedi_loader::DocumentLoader;
use fedi_vocab::Entity;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

/// The `type` value this module produces and recognizes.
pub const SIGNATURE_TYPE: &str = "RsaSignature2017";

/// Create an `RsaSignature2017` signature node for `document`, signed by
/// `key` (which must be RSA).
///
/// `created` defaults to the current time when `None`; tests should pass
/// an explicit value for deterministic output.
///
/// # Errors
///
/// Returns [`ProofError::WrongKeyAlgorithm`] if `key` isn't RSA.
pub fn create_signature(
    document: &Value,
    key: &KeyPair,
    creator: &str,
    created: Option<&str>,
) -> Result<Value, ProofError> {
    if key.algorithm() != KeyAlgorithm::Rsa {
        return Err(ProofError::WrongKeyAlgorithm { cryptosuite: SIGNATURE_TYPE, expected: "RSA" });
    }
    let created = created.map(str::to_string).unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    let options = json!({
        "type": SIGNATURE_TYPE,
        "creator": creator,
        "created": created,
    });

    let signing_bytes = signing_bytes(document, &options);
    let signature = key.sign(&signing_bytes)?;
    let mut node = options;
    if let Value::Object(map) = &mut node {
        map.insert("signatureValue".into(), Value::String(BASE64.encode(signature)));
    }
    Ok(node)
}

/// Attach `signature` to `document`, replacing any prior `signature`
/// property (legacy servers sign once, unlike the multi-proof Data
/// Integrity format).
#[must_use]
pub fn sign_object(mut document: Value, signature: Value) -> Value {
    if let Value::Object(map) = &mut document {
        map.insert("signature".into(), signature);
    }
    document
}

/// Detach and return the `signature` property of `document`, leaving the
/// rest of the document untouched.
#[must_use]
pub fn detach_signature(document: &Value) -> (Value, Option<Value>) {
    match document {
        Value::Object(map) => {
            let mut copy: Map<String, Value> = map.clone();
            let signature = copy.remove("signature");
            (Value::Object(copy), signature)
        }
        other => (other.clone(), None),
    }
}

/// Verify `document`'s attached `signature` property.
///
/// Returns the signer's [`PublicKey`] (always RSA) on success, `None` if
/// there's no `signature` property or it doesn't verify.
///
/// # Errors
///
/// Propagates [`ProofError::KeyFetch`] if the `creator` key document
/// fetch fails.
pub async fn verify_object(document: &Value, loader: &dyn DocumentLoader) -> Result<Option<PublicKey>, ProofError> {
    let (stripped, Some(signature)) = detach_signature(document) else {
        return Ok(None);
    };
    let Some(sig_map) = signature.as_object() else {
        return Ok(None);
    };
    if sig_map.get("type").and_then(Value::as_str) != Some(SIGNATURE_TYPE) {
        return Ok(None);
    }
    let Some(creator) = sig_map.get("creator").and_then(Value::as_str) else {
        return Ok(None);
    };
    let Some(signature_value) = sig_map.get("signatureValue").and_then(Value::as_str) else {
        return Ok(None);
    };
    let Ok(signature_bytes) = BASE64.decode(signature_value) else {
        return Ok(None);
    };

    let mut options = sig_map.clone();
    options.remove("signatureValue");
    let signing_bytes = signing_bytes(&stripped, &Value::Object(options));

    let key_entity = fetch_key(creator, loader).await?;
    let Some(pem) = key_entity.get_str("publicKeyPem") else {
        return Ok(None);
    };
    let Ok(public_key) = fedi_crypto::import_spki(pem) else {
        return Ok(None);
    };

    if public_key.verify(&signing_bytes, &signature_bytes) {
        Ok(Some(public_key))
    } else {
        Ok(None)
    }
}

/// `RsaSignature2017` signs the SHA-256 hash of the canonicalized
/// options concatenated with the SHA-256 hash of the canonicalized
/// document, mirroring [`crate::integrity::create_proof`]'s hashing
/// shape but over JCS rather than the original URDNA2015 this format was
/// historically paired with (this crate only speaks JCS canonicalization,
/// see [`crate::jcs`]).
fn signing_bytes(document: &Value, options: &Value) -> Vec<u8> {
    let document_hash = Sha256::digest(canonicalize(document));
    let options_hash = Sha256::digest(canonicalize(options));
    let mut combined = Vec::with_capacity(64);
    combined.extend_from_slice(&options_hash);
    combined.extend_from_slice(&document_hash);
    combined
}

async fn fetch_key(url: &str, loader: &dyn DocumentLoader) -> Result<Entity, ProofError> {
    let remote = loader.load(url).await?;
    let normalized = fedi_jsonld::expand_for_decode(remote.document.clone()).unwrap_or(remote.document);
    Entity::from_value(normalized)
        .map_err(|e| ProofError::MalformedVerificationMethod { url: url.to_string(), reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fedi_crypto::generate_key_pair;
    use fedi_loader::{LoaderError, RemoteDocument};
    use std::sync::Arc;

    struct StubLoader {
        document: Value,
    }

    #[async_trait]
    impl DocumentLoader for StubLoader {
        async fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
            Ok(RemoteDocument { document_url: url.to_string(), context_url: None, document: self.document.clone() })
        }
    }

    #[tokio::test]
    async fn create_then_verify_round_trips() {
        let key = generate_key_pair(KeyAlgorithm::Rsa).unwrap();
        let pem = fedi_crypto::export_spki(&key.public_key()).unwrap();
        let loader: Arc<dyn DocumentLoader> = Arc::new(StubLoader {
            document: json!({
                "id": "https://server.example/users/alice#main-key",
                "type": "Key",
                "owner": "https://server.example/users/alice",
                "publicKeyPem": pem
            }),
        });

        let document = json!({"type": "Create", "actor": "https://server.example/users/alice"});
        let signature =
            create_signature(&document, &key, "https://server.example/users/alice#main-key", Some("2023-02-24T23:36:38Z"))
                .unwrap();
        let signed = sign_object(document, signature);

        let verified = verify_object(&signed, loader.as_ref()).await.unwrap();
        assert!(verified.is_some());
    }

    #[tokio::test]
    async fn create_signature_rejects_ed25519_key() {
        let key = generate_key_pair(KeyAlgorithm::Ed25519).unwrap();
        let document = json!({"type": "Create"});
        let err = create_signature(&document, &key, "https://example.com/users/a#key", None).unwrap_err();
        assert!(matches!(err, ProofError::WrongKeyAlgorithm { .. }));
    }

    #[tokio::test]
    async fn verify_object_with_no_signature_returns_none() {
        let loader: Arc<dyn DocumentLoader> = Arc::new(StubLoader { document: json!({}) });
        let document = json!({"type": "Note"});
        assert!(verify_object(&document, loader.as_ref()).await.unwrap().is_none());
    }

    #[test]
    fn detach_signature_leaves_rest_untouched() {
        let document = json!({"type": "Note", "content": "hi", "signature": {"type": "RsaSignature2017"}});
        let (stripped, signature) = detach_signature(&document);
        assert!(signature.is_some());
        assert_eq!(stripped["content"], "hi");
        assert!(stripped.get("signature").is_none());
    }
}

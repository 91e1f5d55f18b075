//! FEP-8b32 Object Integrity Proofs (`eddsa-jcs-2022`).
//!
//! A proof is attached to the document it authenticates, under a `proof`
//! property, rather than sent as a separate header the way HTTP Signatures
//! are. Verifying one therefore has to reconstruct exactly the bytes that
//! were hashed at signing time: the proof options (everything but
//! `proofValue`) and the document (everything but `proof`), each
//! JCS-canonicalized and SHA-256-hashed, concatenated proof-hash-then-
//! document-hash, and the result is what `eddsa-jcs-2022` actually signs.

use crate::error::ProofError;
use crate::jcs::canonicalize;
use fedi_crypto::{KeyAlgorithm, KeyPair, PublicKey};
use fedi_loader::DocumentLoader;
use fedi_vocab::{Entity, VocabError};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

/// The one cryptosuite this crate implements.
pub const CRYPTOSUITE: &str = "eddsa-jcs-2022";

/// Create a `DataIntegrityProof` for `document`, signed by `key` (which
/// must be Ed25519).
///
/// `created` is an RFC 3339 / ISO 8601 timestamp string — callers own
/// clock access (see workspace design notes on `Date::now()`-style calls
/// being pushed to the boundary).
///
/// # Errors
///
/// Returns [`ProofError::WrongKeyAlgorithm`] if `key` isn't Ed25519.
pub fn create_proof(
    document: &Value,
    key: &KeyPair,
    verification_method_id: &str,
    created: &str,
) -> Result<Value, ProofError> {
    if key.algorithm() != KeyAlgorithm::Ed25519 {
        return Err(ProofError::WrongKeyAlgorithm { cryptosuite: CRYPTOSUITE, expected: "Ed25519" });
    }

    let proof_options = json!({
        "type": "DataIntegrityProof",
        "cryptosuite": CRYPTOSUITE,
        "created": created,
        "verificationMethod": verification_method_id,
        "proofPurpose": "assertionMethod",
    });

    let signing_hash = signing_hash(document, &proof_options);
    let signature = key.sign(&signing_hash)?;
    let proof_value = format!("z{}", base58::ToBase58::to_base58(signature.as_slice()));

    let mut proof = proof_options;
    if let Value::Object(map) = &mut proof {
        map.insert("proofValue".into(), Value::String(proof_value));
    }
    Ok(proof)
}

/// Attach one or more proofs to `document`, preserving any existing
/// `proof` node(s) already present.
#[must_use]
pub fn sign_object(document: Value, proof: Value) -> Value {
    let Value::Object(mut map) = document else { return document };
    match map.remove("proof") {
        None => {
            map.insert("proof".into(), proof);
        }
        Some(Value::Array(mut existing)) => {
            existing.push(proof);
            map.insert("proof".into(), Value::Array(existing));
        }
        Some(existing) => {
            map.insert("proof".into(), Value::Array(vec![existing, proof]));
        }
    }
    Value::Object(map)
}

/// Verify at least one proof attached to `document`'s `proof` property.
///
/// Returns the [`PublicKey`] (always Ed25519) of whichever proof verified
/// first, or `None` if the document carries no `proof` node or none of its
/// proofs verify.
///
/// # Errors
///
/// Propagates [`ProofError::KeyFetch`] if every candidate proof's
/// `verificationMethod` fetch fails at the network layer (as opposed to
/// simply not verifying).
pub async fn verify_object(document: &Value, loader: &dyn DocumentLoader) -> Result<Option<PublicKey>, ProofError> {
    let Some(proof_node) = document.get("proof") else {
        return Ok(None);
    };
    let proofs: Vec<&Value> = match proof_node {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let stripped = strip_key(document, "proof");
    let mut last_fetch_err = None;
    for proof in proofs {
        match verify_proof(&stripped, proof, loader).await {
            Ok(Some(key)) => return Ok(Some(key)),
            Ok(None) => continue,
            Err(ProofError::KeyFetch(e)) => last_fetch_err = Some(ProofError::KeyFetch(e)),
            Err(_) => continue,
        }
    }
    if let Some(err) = last_fetch_err {
        return Err(err);
    }
    Ok(None)
}

/// Verify a single `proof` object against `document` (already stripped of
/// its own `proof` property).
///
/// # Errors
///
/// Propagates [`ProofError::KeyFetch`] if the document loader errors
/// fetching `verificationMethod`.
pub async fn verify_proof(document: &Value, proof: &Value, loader: &dyn DocumentLoader) -> Result<Option<PublicKey>, ProofError> {
    let Some(proof_map) = proof.as_object() else {
        return Ok(None);
    };
    if proof_map.get("cryptosuite").and_then(Value::as_str) != Some(CRYPTOSUITE) {
        return Ok(None);
    }
    let Some(verification_method) = proof_map.get("verificationMethod").and_then(Value::as_str) else {
        return Ok(None);
    };
    let Some(proof_value) = proof_map.get("proofValue").and_then(Value::as_str) else {
        return Ok(None);
    };
    let Some(signature) = decode_multibase_signature(proof_value) else {
        return Ok(None);
    };

    let proof_options = strip_key(proof, "proofValue");
    let signing_hash = signing_hash(document, &proof_options);

    let key_entity = fetch_multikey(verification_method, loader).await?;
    let Some(public_key_multibase) = key_entity.get_str("publicKeyMultibase") else {
        return Ok(None);
    };
    let Ok(public_key) = fedi_crypto::import_multibase_key(public_key_multibase) else {
        return Ok(None);
    };

    if public_key.verify(&signing_hash, &signature) {
        Ok(Some(public_key))
    } else {
        Ok(None)
    }
}

fn signing_hash(document: &Value, proof_options: &Value) -> Vec<u8> {
    let document_hash = Sha256::digest(canonicalize(document));
    let options_hash = Sha256::digest(canonicalize(proof_options));
    let mut combined = Vec::with_capacity(64);
    combined.extend_from_slice(&options_hash);
    combined.extend_from_slice(&document_hash);
    combined
}

fn decode_multibase_signature(encoded: &str) -> Option<Vec<u8>> {
    let rest = encoded.strip_prefix('z')?;
    base58::FromBase58::from_base58(rest).ok()
}

fn strip_key(value: &Value, key: &str) -> Value {
    match value {
        Value::Object(map) => {
            let mut copy: Map<String, Value> = map.clone();
            copy.remove(key);
            Value::Object(copy)
        }
        other => other.clone(),
    }
}

async fn fetch_multikey(url: &str, loader: &dyn DocumentLoader) -> Result<Entity, ProofError> {
    let anchor = Entity::new("Multikey");
    anchor.dereference(&Value::String(url.to_string()), loader).await.map_err(|e| match e {
        VocabError::Dereference(loader_err) => ProofError::KeyFetch(loader_err),
        other => ProofError::MalformedVerificationMethod { url: url.to_string(), reason: other.to_string() },
    })
}

//! SPKI/PEM import and export, dispatched by algorithm OID.

use crate::error::CryptoError;
use crate::key::{KeyAlgorithm, PublicKey};
use const_oid::ObjectIdentifier;
use pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};

/// RSA encryption OID (`1.2.840.113549.1.1.1`), used both for the
/// `rsaEncryption` SPKI algorithm identifier regardless of signature scheme.
const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Ed25519 OID (`1.3.101.112`).
const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

/// Inspect a SPKI PEM document's algorithm identifier and decode it with the
/// matching key type.
///
/// # Errors
///
/// Returns [`CryptoError::MalformedKey`] if the PEM cannot be parsed, and
/// [`CryptoError::UnsupportedAlgorithm`] if the SPKI algorithm OID is
/// neither RSA nor Ed25519.
pub fn import_spki(pem: &str) -> Result<PublicKey, CryptoError> {
    let (_label, der) = pem_rfc7468::decode_vec(pem.as_bytes()).map_err(|e| CryptoError::MalformedKey {
        format: "spki-pem",
        reason: e.to_string(),
    })?;

    let spki = spki::SubjectPublicKeyInfoRef::try_from(der.as_slice()).map_err(|e| CryptoError::MalformedKey {
        format: "spki-pem",
        reason: e.to_string(),
    })?;
    let oid = spki.algorithm.oid;

    if oid == OID_RSA_ENCRYPTION {
        let key = rsa::RsaPublicKey::from_public_key_pem(pem).map_err(|e| CryptoError::MalformedKey {
            format: "spki-pem",
            reason: e.to_string(),
        })?;
        Ok(PublicKey::Rsa(key))
    } else if oid == OID_ED25519 {
        let key = ed25519_dalek::VerifyingKey::from_public_key_pem(pem).map_err(|e| CryptoError::MalformedKey {
            format: "spki-pem",
            reason: e.to_string(),
        })?;
        Ok(PublicKey::Ed25519(key))
    } else {
        Err(CryptoError::UnsupportedAlgorithm { algorithm: oid.to_string() })
    }
}

/// Encode a public key as a SPKI PEM document.
///
/// # Errors
///
/// Returns [`CryptoError::MalformedKey`] if the underlying encoder fails
/// (only possible for keys in an invalid internal state, which cannot occur
/// for keys produced by [`crate::key::generate_key_pair`]).
pub fn export_spki(key: &PublicKey) -> Result<String, CryptoError> {
    let encode = |result: Result<String, pkcs8::spki::Error>| {
        result.map_err(|e| CryptoError::MalformedKey { format: "spki-pem", reason: e.to_string() })
    };
    match key {
        PublicKey::Rsa(k) => encode(k.to_public_key_pem(LineEnding::LF)),
        PublicKey::Ed25519(k) => encode(k.to_public_key_pem(LineEnding::LF)),
    }
}

/// The key algorithm a SPKI PEM document's OID names, without fully decoding
/// the key. Used by [`crate::validate_key_material`] and document-loader
/// diagnostics that only need to know the algorithm.
///
/// # Errors
///
/// Returns [`CryptoError::MalformedKey`] on unparseable PEM, and
/// [`CryptoError::UnsupportedAlgorithm`] for any OID other than RSA or
/// Ed25519.
pub fn algorithm_of_spki(pem: &str) -> Result<KeyAlgorithm, CryptoError> {
    let (_label, der) = pem_rfc7468::decode_vec(pem.as_bytes()).map_err(|e| CryptoError::MalformedKey {
        format: "spki-pem",
        reason: e.to_string(),
    })?;
    let spki = spki::SubjectPublicKeyInfoRef::try_from(der.as_slice()).map_err(|e| CryptoError::MalformedKey {
        format: "spki-pem",
        reason: e.to_string(),
    })?;
    match spki.algorithm.oid {
        oid if oid == OID_RSA_ENCRYPTION => Ok(KeyAlgorithm::Rsa),
        oid if oid == OID_ED25519 => Ok(KeyAlgorithm::Ed25519),
        oid => Err(CryptoError::UnsupportedAlgorithm { algorithm: oid.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::generate_key_pair;

    #[test]
    fn rsa_spki_roundtrips() {
        let pair = generate_key_pair(KeyAlgorithm::Rsa).unwrap();
        let pem = export_spki(&pair.public_key()).unwrap();
        let imported = import_spki(&pem).unwrap();
        assert_eq!(imported.algorithm(), KeyAlgorithm::Rsa);
    }

    #[test]
    fn ed25519_spki_roundtrips() {
        let pair = generate_key_pair(KeyAlgorithm::Ed25519).unwrap();
        let pem = export_spki(&pair.public_key()).unwrap();
        let imported = import_spki(&pem).unwrap();
        assert_eq!(imported.algorithm(), KeyAlgorithm::Ed25519);
    }

    #[test]
    fn algorithm_of_spki_matches_key_type() {
        let pair = generate_key_pair(KeyAlgorithm::Ed25519).unwrap();
        let pem = export_spki(&pair.public_key()).unwrap();
        assert_eq!(algorithm_of_spki(&pem).unwrap(), KeyAlgorithm::Ed25519);
    }

    #[test]
    fn import_rejects_garbage_pem() {
        let err = import_spki("not a pem document").unwrap_err();
        assert!(matches!(err, CryptoError::MalformedKey { .. }));
    }

    #[test]
    fn imported_rsa_key_verifies_signature_from_original_pair() {
        let pair = generate_key_pair(KeyAlgorithm::Rsa).unwrap();
        let pem = export_spki(&pair.public_key()).unwrap();
        let imported = import_spki(&pem).unwrap();
        let sig = pair.sign(b"payload").unwrap();
        assert!(imported.verify(b"payload", &sig));
    }
}

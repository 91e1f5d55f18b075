//! Key algorithms, keypairs, and signing.

use crate::error::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::OsRng;
use rsa::pkcs1v15::{SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier as RsaVerifierTrait};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

/// The RSA bit length this crate generates. 2048 is the floor federated
/// servers interoperate with; there is no reason to go larger for a
/// signing-only key that never protects long-lived secrets.
pub const RSA_KEY_BITS: usize = 2048;

/// One of the two key algorithms this framework supports.
///
/// Unlike the distilled spec's key-generation API, there is no default
/// algorithm: callers name one explicitly (a Rust-idiomatic REDESIGN — see
/// the workspace design notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    /// RSASSA-PKCS1-v1.5 with SHA-256.
    Rsa,
    /// Ed25519.
    Ed25519,
}

/// A generated or imported asymmetric keypair.
#[derive(Debug)]
pub enum KeyPair {
    /// An RSA keypair, always SHA-256.
    Rsa {
        /// The private signing key.
        private: Box<RsaPrivateKey>,
        /// The corresponding public key.
        public: RsaPublicKey,
    },
    /// An Ed25519 keypair.
    Ed25519 {
        /// The private signing key.
        signing: SigningKey,
        /// The corresponding public key.
        verifying: VerifyingKey,
    },
}

impl KeyPair {
    /// The algorithm this keypair uses.
    #[must_use]
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::Rsa { .. } => KeyAlgorithm::Rsa,
            KeyPair::Ed25519 { .. } => KeyAlgorithm::Ed25519,
        }
    }

    /// Extract the public half as a [`PublicKey`].
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::Ed25519 { verifying, .. } => PublicKey::Ed25519(*verifying),
        }
    }

    /// Sign `data`, returning the raw signature bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignFailed`] if the underlying RSA signer
    /// rejects the input (this cannot happen for Ed25519, which is
    /// infallible).
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            KeyPair::Rsa { private, .. } => {
                let signing_key = RsaSigningKey::<Sha256>::new(private.as_ref().clone());
                let signature = signing_key.try_sign_with_rng(&mut OsRng, data).map_err(|e| {
                    CryptoError::SignFailed { reason: e.to_string() }
                })?;
                Ok(signature.to_vec())
            }
            KeyPair::Ed25519 { signing, .. } => Ok(signing.sign(data).to_bytes().to_vec()),
        }
    }
}

/// A public key extracted from a [`KeyPair`] or imported independently.
#[derive(Debug, Clone)]
pub enum PublicKey {
    /// An RSA public key.
    Rsa(RsaPublicKey),
    /// An Ed25519 public key.
    Ed25519(VerifyingKey),
}

impl PublicKey {
    /// The algorithm this key uses.
    #[must_use]
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Rsa(_) => KeyAlgorithm::Rsa,
            PublicKey::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    /// Verify `signature` over `data`.
    #[must_use]
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match self {
            PublicKey::Rsa(key) => {
                let Ok(sig) = rsa::pkcs1v15::Signature::try_from(signature) else {
                    return false;
                };
                let verifying_key = RsaVerifyingKey::<Sha256>::new(key.clone());
                RsaVerifierTrait::verify(&verifying_key, data, &sig).is_ok()
            }
            PublicKey::Ed25519(key) => {
                let Ok(sig_bytes): Result<[u8; 64], _> = signature.try_into() else {
                    return false;
                };
                let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
                key.verify(data, &sig).is_ok()
            }
        }
    }
}

/// Generate a fresh keypair for the given algorithm.
///
/// # Errors
///
/// Returns [`CryptoError::SignFailed`] only for RSA, if the underlying
/// prime-generation routine fails (astronomically unlikely at
/// [`RSA_KEY_BITS`]).
pub fn generate_key_pair(algorithm: KeyAlgorithm) -> Result<KeyPair, CryptoError> {
    match algorithm {
        KeyAlgorithm::Rsa => {
            let private = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
                .map_err(|e| CryptoError::SignFailed { reason: e.to_string() })?;
            let public = RsaPublicKey::from(&private);
            Ok(KeyPair::Rsa { private: Box::new(private), public })
        }
        KeyAlgorithm::Ed25519 => {
            let signing = SigningKey::generate(&mut OsRng);
            let verifying = signing.verifying_key();
            Ok(KeyPair::Ed25519 { signing, verifying })
        }
    }
}

/// Validate that `key` is well-formed for federation use: one of the two
/// supported algorithms, and (for RSA) SHA-256.
///
/// Keys constructed through this crate are always valid by type
/// construction; this exists for keys decoded from untrusted wire input via
/// [`crate::spki::import_spki`] or [`crate::jwk::import_jwk`], which may
/// name an unsupported digest in their encoded form.
pub fn validate_key(digest_name: Option<&str>) -> Result<(), CryptoError> {
    if let Some(name) = digest_name {
        if !name.eq_ignore_ascii_case("sha-256") && !name.eq_ignore_ascii_case("sha256") {
            return Err(CryptoError::UnsupportedDigest { digest: name.to_string() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_ed25519_roundtrips_sign_verify() {
        let pair = generate_key_pair(KeyAlgorithm::Ed25519).unwrap();
        let sig = pair.sign(b"hello").unwrap();
        assert!(pair.public_key().verify(b"hello", &sig));
        assert!(!pair.public_key().verify(b"goodbye", &sig));
    }

    #[test]
    fn generate_rsa_roundtrips_sign_verify() {
        let pair = generate_key_pair(KeyAlgorithm::Rsa).unwrap();
        let sig = pair.sign(b"hello").unwrap();
        assert!(pair.public_key().verify(b"hello", &sig));
        assert!(!pair.public_key().verify(b"goodbye", &sig));
    }

    #[test]
    fn algorithm_reported_correctly() {
        assert_eq!(generate_key_pair(KeyAlgorithm::Rsa).unwrap().algorithm(), KeyAlgorithm::Rsa);
        assert_eq!(
            generate_key_pair(KeyAlgorithm::Ed25519).unwrap().algorithm(),
            KeyAlgorithm::Ed25519
        );
    }

    #[test]
    fn validate_key_accepts_sha256() {
        assert!(validate_key(Some("sha-256")).is_ok());
        assert!(validate_key(None).is_ok());
    }

    #[test]
    fn validate_key_rejects_other_digests() {
        let err = validate_key(Some("sha-1")).unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedDigest { .. }));
    }

    #[test]
    fn cross_key_verification_fails() {
        let a = generate_key_pair(KeyAlgorithm::Ed25519).unwrap();
        let b = generate_key_pair(KeyAlgorithm::Ed25519).unwrap();
        let sig = a.sign(b"hello").unwrap();
        assert!(!b.public_key().verify(b"hello", &sig));
    }
}

//! JSON Web Key import/export for the two supported algorithms.

use crate::error::CryptoError;
use crate::key::{KeyPair, PublicKey};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};

/// A minimal JWK representation covering only the fields this framework's
/// two supported algorithms populate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type: `"RSA"` or `"OKP"`.
    pub kty: String,
    /// Algorithm hint: `"RS256"` for RSA, absent for OKP/Ed25519.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Curve, for `OKP` keys: always `"Ed25519"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// RSA modulus, base64url, no padding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent, base64url, no padding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// OKP/Ed25519 public key bytes, base64url, no padding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// OKP/Ed25519 private key seed, base64url, no padding. Only ever
    /// present on a JWK produced for or consumed by a signing key import —
    /// [`export_jwk`] (which only ever sees a [`PublicKey`]) never sets it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

/// Encode a public key as a JWK.
#[must_use]
pub fn export_jwk(key: &PublicKey) -> Jwk {
    match key {
        PublicKey::Rsa(k) => Jwk {
            kty: "RSA".into(),
            alg: Some("RS256".into()),
            crv: None,
            n: Some(URL_SAFE_NO_PAD.encode(k.n().to_bytes_be())),
            e: Some(URL_SAFE_NO_PAD.encode(k.e().to_bytes_be())),
            x: None,
            d: None,
        },
        PublicKey::Ed25519(k) => Jwk {
            kty: "OKP".into(),
            alg: None,
            crv: Some("Ed25519".into()),
            n: None,
            e: None,
            x: Some(URL_SAFE_NO_PAD.encode(k.as_bytes())),
            d: None,
        },
    }
}

/// Decode a JWK into a public key.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedAlgorithm`] for any `kty`/`crv` other
/// than `RSA` or `OKP`/`Ed25519`, and [`CryptoError::MalformedKey`] if the
/// required fields for the detected algorithm are missing or not valid
/// base64url.
pub fn import_jwk(jwk: &Jwk) -> Result<PublicKey, CryptoError> {
    match jwk.kty.as_str() {
        "RSA" => {
            let n = jwk.n.as_deref().ok_or_else(|| CryptoError::MalformedKey {
                format: "jwk",
                reason: "missing 'n'".into(),
            })?;
            let e = jwk.e.as_deref().ok_or_else(|| CryptoError::MalformedKey {
                format: "jwk",
                reason: "missing 'e'".into(),
            })?;
            let n_bytes = URL_SAFE_NO_PAD
                .decode(n)
                .map_err(|err| CryptoError::MalformedKey { format: "jwk", reason: err.to_string() })?;
            let e_bytes = URL_SAFE_NO_PAD
                .decode(e)
                .map_err(|err| CryptoError::MalformedKey { format: "jwk", reason: err.to_string() })?;
            let key = rsa::RsaPublicKey::new(
                rsa::BigUint::from_bytes_be(&n_bytes),
                rsa::BigUint::from_bytes_be(&e_bytes),
            )
            .map_err(|err| CryptoError::MalformedKey { format: "jwk", reason: err.to_string() })?;
            Ok(PublicKey::Rsa(key))
        }
        "OKP" if jwk.crv.as_deref() == Some("Ed25519") => {
            let x = jwk.x.as_deref().ok_or_else(|| CryptoError::MalformedKey {
                format: "jwk",
                reason: "missing 'x'".into(),
            })?;
            let bytes = URL_SAFE_NO_PAD
                .decode(x)
                .map_err(|err| CryptoError::MalformedKey { format: "jwk", reason: err.to_string() })?;
            let array: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::MalformedKey {
                format: "jwk",
                reason: "Ed25519 'x' must be 32 bytes".into(),
            })?;
            let key = ed25519_dalek::VerifyingKey::from_bytes(&array).map_err(|err| CryptoError::MalformedKey {
                format: "jwk",
                reason: err.to_string(),
            })?;
            Ok(PublicKey::Ed25519(key))
        }
        "OKP" => Err(CryptoError::UnsupportedAlgorithm {
            algorithm: jwk.crv.clone().unwrap_or_else(|| "unknown".into()),
        }),
        other => Err(CryptoError::UnsupportedAlgorithm { algorithm: other.to_string() }),
    }
}

/// Decode a JWK carrying private key material (`d`) into a [`KeyPair`].
///
/// Only Ed25519 (`OKP`/`Ed25519`) is supported: this crate's minimal `Jwk`
/// shape has no room for an RSA private key's prime factors, so an RSA `d`
/// can't be reconstructed into a usable [`rsa::RsaPrivateKey`] from this
/// representation alone.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedAlgorithm`] for `kty: "RSA"` or any
/// curve other than `Ed25519`, and [`CryptoError::MalformedKey`] if `d` is
/// missing or not a valid 32-byte base64url seed.
pub fn import_jwk_private_key(jwk: &Jwk) -> Result<KeyPair, CryptoError> {
    match jwk.kty.as_str() {
        "OKP" if jwk.crv.as_deref() == Some("Ed25519") => {
            let d = jwk
                .d
                .as_deref()
                .ok_or_else(|| CryptoError::MalformedKey { format: "jwk", reason: "missing 'd'".into() })?;
            let bytes = URL_SAFE_NO_PAD
                .decode(d)
                .map_err(|err| CryptoError::MalformedKey { format: "jwk", reason: err.to_string() })?;
            let seed: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::MalformedKey {
                format: "jwk",
                reason: "Ed25519 'd' must be 32 bytes".into(),
            })?;
            let signing = SigningKey::from_bytes(&seed);
            let verifying = signing.verifying_key();
            Ok(KeyPair::Ed25519 { signing, verifying })
        }
        "RSA" => Err(CryptoError::UnsupportedAlgorithm { algorithm: "RSA private-key import".into() }),
        other => Err(CryptoError::UnsupportedAlgorithm { algorithm: other.to_string() }),
    }
}

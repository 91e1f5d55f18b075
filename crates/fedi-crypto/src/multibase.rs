//! Multibase(-btc)-encoded key import/export, as used by FEP-8b32
//! `Multikey` verification methods.

use crate::error::CryptoError;
use crate::key::PublicKey;

/// Multicodec prefix for an Ed25519 public key (`0xed01`).
const MULTICODEC_ED25519_PUB: [u8; 2] = [0xed, 0x01];

/// Multicodec prefix for an RSA public key (`0x1205`).
const MULTICODEC_RSA_PUB: [u8; 2] = [0x12, 0x05];

/// The `z` multibase prefix character for base58btc, the only multibase
/// encoding ActivityPub's `Multikey` verification method uses.
const MULTIBASE_BASE58BTC_PREFIX: char = 'z';

/// Encode a public key as a `did:key`-style multibase string
/// (`z` + base58btc(multicodec-prefix || key-bytes)).
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedAlgorithm`] for RSA keys: RSA has no
/// standardized multicodec key-encoding length (the modulus size varies),
/// so only Ed25519 keys are supported in multibase form.
pub fn export_multibase_key(key: &PublicKey) -> Result<String, CryptoError> {
    match key {
        PublicKey::Ed25519(k) => {
            let mut bytes = Vec::with_capacity(2 + 32);
            bytes.extend_from_slice(&MULTICODEC_ED25519_PUB);
            bytes.extend_from_slice(k.as_bytes());
            Ok(format!("{MULTIBASE_BASE58BTC_PREFIX}{}", base58::ToBase58::to_base58(bytes.as_slice())))
        }
        PublicKey::Rsa(_) => Err(CryptoError::UnsupportedAlgorithm {
            algorithm: "rsa (multibase encoding unsupported)".into(),
        }),
    }
}

/// Decode a `did:key`-style multibase string into a public key.
///
/// # Errors
///
/// Returns [`CryptoError::MalformedKey`] if the string doesn't start with
/// the base58btc `z` prefix, fails to decode, or the decoded multicodec
/// prefix doesn't match a supported key type.
pub fn import_multibase_key(encoded: &str) -> Result<PublicKey, CryptoError> {
    let rest = encoded.strip_prefix(MULTIBASE_BASE58BTC_PREFIX).ok_or_else(|| CryptoError::MalformedKey {
        format: "multibase",
        reason: "only base58btc ('z'-prefixed) multikeys are supported".into(),
    })?;
    let bytes = base58::FromBase58::from_base58(rest).map_err(|_| CryptoError::MalformedKey {
        format: "multibase",
        reason: "invalid base58btc payload".into(),
    })?;

    if bytes.len() >= 2 && bytes[..2] == MULTICODEC_ED25519_PUB {
        let key_bytes: [u8; 32] = bytes[2..].try_into().map_err(|_| CryptoError::MalformedKey {
            format: "multibase",
            reason: "Ed25519 multikey payload must be 32 bytes".into(),
        })?;
        let key = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes).map_err(|e| CryptoError::MalformedKey {
            format: "multibase",
            reason: e.to_string(),
        })?;
        Ok(PublicKey::Ed25519(key))
    } else if bytes.len() >= 2 && bytes[..2] == MULTICODEC_RSA_PUB {
        Err(CryptoError::UnsupportedAlgorithm {
            algorithm: "rsa (multibase decoding unsupported)".into(),
        })
    } else {
        Err(CryptoError::MalformedKey {
            format: "multibase",
            reason: "unrecognized multicodec prefix".into(),
        })
    }
}

#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Key generation, import/export, and signing for the federation framework.
//!
//! Supports exactly two algorithms — RSASSA-PKCS1-v1.5 with SHA-256, and
//! Ed25519 — in three wire encodings: SPKI PEM, JWK, and multibase
//! (`did:key`-style, Ed25519 only). Every key this crate produces is
//! "extractable" by construction: there is no HSM-backed key handle, so the
//! distilled spec's runtime extractability check collapses to a type-level
//! guarantee (see the workspace design notes).
//!
//! ```
//! use fedi_crypto::{generate_key_pair, KeyAlgorithm};
//!
//! let pair = generate_key_pair(KeyAlgorithm::Ed25519).unwrap();
//! let signature = pair.sign(b"activity bytes").unwrap();
//! assert!(pair.public_key().verify(b"activity bytes", &signature));
//! ```

/// Errors raised by key handling.
pub mod error;
/// JWK import/export.
pub mod jwk;
/// Key algorithms, keypairs, and signing.
pub mod key;
/// Multibase (`did:key`-style) key import/export.
pub mod multibase;
/// SPKI/PEM key import/export.
pub mod spki;

pub use error::CryptoError;
pub use jwk::{export_jwk, import_jwk, import_jwk_private_key, Jwk};
pub use key::{generate_key_pair, validate_key, KeyAlgorithm, KeyPair, PublicKey};
pub use multibase::{export_multibase_key, import_multibase_key};
pub use spki::{algorithm_of_spki, export_spki, import_spki};

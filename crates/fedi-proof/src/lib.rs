#![warn(missing_docs)]
//! Object-embedded authentication for ActivityPub documents: FEP-8b32
//! Object Integrity Proofs ([`integrity`]) and legacy Linked Data
//! Signatures ([`ld_signature`]), both built on RFC 8785 JSON
//! Canonicalization ([`jcs`]).
//!
//! Unlike [`fedi_httpsig`], which authenticates an HTTP request, these
//! two formats authenticate the document itself and travel with it
//! (forwarded activities, relayed mail, anything that outlives the
//! original request). The inbox pipeline tries [`integrity::verify_object`]
//! first, then [`ld_signature::verify_object`], before falling back to
//! HTTP Signatures.

/// Errors raised by this crate's proof/signature operations.
pub mod error;
/// FEP-8b32 Object Integrity Proofs (`eddsa-jcs-2022`).
pub mod integrity;
/// RFC 8785 JSON Canonicalization Scheme.
pub mod jcs;
/// Legacy `RsaSignature2017` Linked Data Signatures.
pub mod ld_signature;

pub use error::ProofError;
pub use integrity::{create_proof, verify_proof, CRYPTOSUITE};
pub use jcs::canonicalize;

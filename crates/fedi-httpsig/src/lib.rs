#![warn(missing_docs)]
//! draft-cavage HTTP Signatures (`rsa-sha256`): signing, verification, and
//! the actor-ownership check the inbox pipeline uses to accept an `rsa-sha256`
//! signature as proof an activity's actor authored it.

/// `Digest` header computation and verification.
pub mod digest;
/// HTTP Signature errors.
pub mod error;
/// `sign_request`.
pub mod sign;
/// `Signature` header parsing/building and signing-string construction.
pub mod signature_string;
/// [`fedi_loader::RequestSigner`] adapter.
pub mod signer;
/// `verify_request` and `does_actor_own_key`.
pub mod verify;

pub use error::HttpSigError;
pub use sign::sign_request;
pub use signer::HttpSignatureSigner;
pub use verify::{does_actor_own_key, verify_request, VerifyOptions};

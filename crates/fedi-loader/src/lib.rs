#![deny(unsafe_code)]
#![warn(missing_docs)]
//! A caching, SSRF-guarded JSON-LD document loader.
//!
//! [`loader::HttpDocumentLoader`] is the default implementation: it
//! resolves and rejects loopback/private/link-local targets
//! ([`url_policy`]), coalesces concurrent fetches for the same URL, and
//! caches results with a per-host TTL rule list ([`cache`]) on top of a
//! pluggable [`kv_store::KvStore`]. [`authorized::AuthorizedDocumentLoader`]
//! wraps any loader to sign outbound GETs for servers running in
//! authorized-fetch mode.

/// Authorized (HTTP-signed) fetch wrapper.
pub mod authorized;
/// TTL-ruled caching on top of a [`kv_store::KvStore`].
pub mod cache;
/// Loader error types.
pub mod error;
/// The pluggable key-value store trait and in-memory default.
pub mod kv_store;
/// The base HTTP document loader.
pub mod loader;
/// The signing-boundary trait shared with `fedi-httpsig`.
pub mod signer;
/// SSRF guard: private/loopback/link-local address rejection.
pub mod url_policy;

pub use cache::{CacheRule, RemoteDocument, DEFAULT_TTL_SECS};
pub use error::LoaderError;
pub use kv_store::{InMemoryKvStore, KvStore};
pub use loader::{build_user_agent, DocumentLoader, HttpDocumentLoader};
pub use signer::RequestSigner;

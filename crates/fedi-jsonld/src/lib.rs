#![deny(unsafe_code)]
#![warn(missing_docs)]
//! JSON-LD context resolution and term compaction for ActivityStreams
//! documents.
//!
//! Scoped deliberately: this is not a general-purpose JSON-LD 1.1 processor
//! in the shape of `json-ld`/`json-syntax` (full expansion/compaction
//! algorithms over arbitrary RDF documents, with remote context caching,
//! `@graph`/`@nest`/framing support, and their own AST crate for JSON
//! values). It understands the handful of `@context` shapes ActivityPub
//! documents actually use — the bare `https://www.w3.org/ns/activitystreams`
//! IRI, the `[activitystreams, security]` array, and inline term-override
//! objects — and compacts them down to the canonical term names
//! [`fedi_vocab::Entity`] expects. See `DESIGN.md` §4.A.1 for why this crate
//! doesn't depend on `json-ld` directly.
//!
//! ```
//! use fedi_jsonld::compact_document;
//! use serde_json::json;
//!
//! let doc = json!({
//!     "@context": "https://www.w3.org/ns/activitystreams",
//!     "type": "Note",
//!     "content": "hello"
//! });
//! let compacted = compact_document(doc).unwrap();
//! assert_eq!(compacted["content"], json!("hello"));
//! ```

/// Context compaction against arbitrary remote `@context` documents.
pub mod compact;
/// Built-in AS2 and `security/v1` context term tables.
pub mod context;
/// Errors raised during context resolution.
pub mod error;

pub use compact::{compact_document, expand_for_decode};
pub use context::{known_terms, ACTIVITYSTREAMS_CONTEXT, SECURITY_CONTEXT};
pub use error::JsonLdError;

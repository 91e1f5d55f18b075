#![warn(missing_docs)]
//! ActivityStreams 2.0 / ActivityPub vocabulary types.
//!
//! [`base::Entity`] is the generic, schema-driven property bag every
//! concrete type in [`types`] wraps; [`schema::SCHEMA_TABLE`] declares each
//! type's properties and inheritance once, and [`codec`] layers typed
//! encode/decode on top via the [`codec::TypedEntity`] trait. This crate
//! does not fetch anything itself — [`base::Entity::dereference`] takes a
//! [`fedi_loader::DocumentLoader`] so an unresolved reference property can
//! be fetched by whatever the caller already uses for that.
//!
//! ```
//! use fedi_vocab::codec::{decode, encode};
//! use fedi_vocab::types::Note;
//! use serde_json::json;
//!
//! let document = json!({
//!     "@context": "https://www.w3.org/ns/activitystreams",
//!     "type": "Note",
//!     "content": "hello, fediverse"
//! });
//! let note: Note = decode(document).unwrap();
//! assert_eq!(note.content(), Some("hello, fediverse"));
//! assert_eq!(encode(&note)["content"], json!("hello, fediverse"));
//! ```

/// The generic entity model: property bag, lazy dereference, schema-driven
/// decode.
pub mod base;
/// Typed encode/decode entry points.
pub mod codec;
/// Vocabulary errors.
pub mod error;
/// The `Recipient` trait for delivery-capable actors.
pub mod recipient;
/// Compile-time schema tables declaring each type's properties and
/// inheritance.
pub mod schema;
/// Concrete AS2/ActivityPub vocabulary types.
pub mod types;

pub use base::Entity;
pub use codec::{decode, decode_bare, encode, TypedEntity};
pub use error::VocabError;
pub use recipient::Recipient;

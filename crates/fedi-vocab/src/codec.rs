//! Typed encode/decode entry points layered on top of [`crate::base::Entity`].
//!
//! [`TypedEntity`] is the seam [`crate::types`]'s `macro_rules!`-generated
//! wrappers implement: it turns a generic [`Entity`] into (and back out of)
//! a concrete Rust type while checking the decoded document's `@type`
//! actually matches (or subtypes) what the caller asked for.

use crate::base::Entity;
use crate::error::VocabError;
use crate::schema;
use fedi_jsonld::{ACTIVITYSTREAMS_CONTEXT, SECURITY_CONTEXT};
use serde_json::{json, Map, Value};

/// A concrete vocabulary type backed by an [`Entity`].
pub trait TypedEntity: Sized {
    /// The compact type name this wrapper decodes/encodes as.
    const TYPE_NAME: &'static str;

    /// Wrap a raw entity, without re-checking its type. Used internally by
    /// [`decode`]; prefer that over calling this directly.
    fn from_entity(entity: Entity) -> Self;

    /// Borrow the backing entity.
    fn entity(&self) -> &Entity;

    /// Mutably borrow the backing entity.
    fn entity_mut(&mut self) -> &mut Entity;

    /// Consume the wrapper, returning the backing entity.
    fn into_entity(self) -> Entity;
}

/// Decode a full JSON-LD document (with `@context`) into a concrete type,
/// verifying the decoded `@type` is `T::TYPE_NAME` or one of its subtypes.
///
/// # Errors
///
/// Propagates [`fedi_jsonld::JsonLdError`] (as [`VocabError::JsonLd`]) for a
/// malformed or missing `@context`, and returns
/// [`VocabError::TypeMismatch`] if the decoded type doesn't match.
pub fn decode<T: TypedEntity>(document: Value) -> Result<T, VocabError> {
    let original = document.clone();
    let normalized = fedi_jsonld::expand_for_decode(document)?;
    let mut entity = Entity::from_value(normalized)?;
    if !entity.is_a(T::TYPE_NAME) {
        return Err(VocabError::TypeMismatch { actual: entity.type_name().to_string(), expected: T::TYPE_NAME });
    }
    entity.set_raw(original);
    Ok(T::from_entity(entity))
}

/// Decode a JSON value that has already had `@context` stripped/normalized
/// (e.g. a nested embedded object read off a parent entity).
///
/// # Errors
///
/// Same as [`decode`], minus the `@context` handling.
pub fn decode_bare<T: TypedEntity>(value: Value) -> Result<T, VocabError> {
    let original = value.clone();
    let mut entity = Entity::from_value(value)?;
    if !entity.is_a(T::TYPE_NAME) {
        return Err(VocabError::TypeMismatch { actual: entity.type_name().to_string(), expected: T::TYPE_NAME });
    }
    entity.set_raw(original);
    Ok(T::from_entity(entity))
}

/// Encode a concrete type back into a full JSON-LD document.
///
/// If `value` was produced by [`decode`]/[`decode_bare`] and hasn't been
/// mutated since, the cached original document is returned verbatim (the
/// spec's lossless round-trip guarantee) rather than rebuilt from its
/// properties. Otherwise the document is rebuilt, attaching the `@context`
/// the entity's properties require (the bare AS2 IRI, or the two-element
/// array when a `security/v1` term like `publicKey` is set), and nested
/// objects flagged `embed_context` in the schema get their own `@context`.
#[must_use]
pub fn encode<T: TypedEntity>(value: &T) -> Value {
    if let Some(raw) = value.entity().raw() {
        return raw.clone();
    }
    let mut document = value.entity().to_value();
    if let Value::Object(map) = &mut document {
        map.insert("@context".into(), context_for(value.entity()));
        embed_contexts(map, value.entity());
    }
    document
}

/// Post-process `document` to embed `@context` on each nested object
/// belonging to a property the schema flags `embed_context`, so that
/// object is independently interpretable (per spec.md's `embedContext`
/// data-model property).
fn embed_contexts(document: &mut Map<String, Value>, entity: &Entity) {
    for prop in schema::all_properties(entity.type_name()) {
        if !prop.embed_context {
            continue;
        }
        let Some(value) = document.get_mut(prop.name) else { continue };
        match value {
            Value::Object(nested) => embed_context_into(nested),
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(nested) = item {
                        embed_context_into(nested);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Attach a `@context` to `object` (a nested embedded document) if it uses
/// any `security/v1` term and doesn't already carry one.
fn embed_context_into(object: &mut Map<String, Value>) {
    if object.contains_key("@context") {
        return;
    }
    let uses_security = SECURITY_TERMS.iter().any(|term| object.contains_key(*term));
    if uses_security {
        object.insert("@context".into(), json!([ACTIVITYSTREAMS_CONTEXT, SECURITY_CONTEXT]));
    }
}

const SECURITY_TERMS: &[&str] =
    &["publicKey", "publicKeyPem", "owner", "assertionMethod", "publicKeyMultibase", "controller", "proof", "signature"];

fn context_for(entity: &Entity) -> Value {
    let uses_security = SECURITY_TERMS
        .iter()
        .any(|term| entity.get_functional(term).is_some() || !entity.get_plural(term).is_empty());
    if uses_security {
        json!([ACTIVITYSTREAMS_CONTEXT, SECURITY_CONTEXT])
    } else {
        json!(ACTIVITYSTREAMS_CONTEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Note;

    #[test]
    fn decode_rejects_wrong_type() {
        let document = json!({
            "@context": ACTIVITYSTREAMS_CONTEXT,
            "type": "Person",
            "preferredUsername": "alice"
        });
        let err = decode::<Note>(document).unwrap_err();
        assert!(matches!(err, VocabError::TypeMismatch { .. }));
    }

    #[test]
    fn encode_then_decode_roundtrips_a_note() {
        let mut entity = Entity::new("Note");
        entity.set_id("https://example.com/notes/1");
        entity.set_functional("content", json!("hello"));
        let note = Note::from_entity(entity);
        let document = encode(&note);
        assert_eq!(document["@context"], json!(ACTIVITYSTREAMS_CONTEXT));
        let decoded: Note = decode(document).unwrap();
        assert_eq!(decoded.content(), Some("hello"));
    }

    #[test]
    fn encode_includes_security_context_when_public_key_set() {
        use crate::types::Person;
        let mut entity = Entity::new("Person");
        entity.set_id("https://example.com/users/a");
        entity.set_plural("publicKey", vec![json!({"id": "https://example.com/users/a#main-key"})]).unwrap();
        let person = Person::from_entity(entity);
        let document = encode(&person);
        assert_eq!(document["@context"], json!([ACTIVITYSTREAMS_CONTEXT, SECURITY_CONTEXT]));
    }

    #[test]
    fn encode_embeds_context_on_a_public_key_using_security_terms() {
        use crate::types::Person;
        let mut entity = Entity::new("Person");
        entity.set_id("https://example.com/users/a");
        entity
            .set_plural(
                "publicKey",
                vec![json!({
                    "id": "https://example.com/users/a#main-key",
                    "owner": "https://example.com/users/a",
                    "publicKeyPem": "-----BEGIN PUBLIC KEY-----\n...\n-----END PUBLIC KEY-----"
                })],
            )
            .unwrap();
        let person = Person::from_entity(entity);
        let document = encode(&person);
        assert_eq!(document["publicKey"][0]["@context"], json!([ACTIVITYSTREAMS_CONTEXT, SECURITY_CONTEXT]));
    }

    #[test]
    fn encode_returns_the_cached_raw_document_verbatim() {
        let original = json!({
            "@context": ACTIVITYSTREAMS_CONTEXT,
            "type": "Note",
            "content": "hello",
            "toot:votersCount": 3
        });
        let note: Note = decode(original.clone()).unwrap();
        assert_eq!(encode(&note), original);
    }
}

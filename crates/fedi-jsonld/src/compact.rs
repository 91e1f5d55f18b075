//! Context-aware compaction of arbitrary ActivityStreams JSON-LD documents
//! into the term shape [`fedi_vocab::Entity`] expects.
//!
//! This is not a general JSON-LD 1.1 processor. It resolves exactly the
//! `@context` shapes ActivityPub documents use in practice — the bare AS2
//! IRI, the two-element `[activitystreams, security]` array, and inline
//! term-override objects — and leaves everything else untouched. A document
//! using an @context this crate doesn't recognize is returned unchanged
//! rather than rejected: unknown terms are exactly the extension
//! vocabularies (`toot:`, `misskey:`, ...) federated servers are expected to
//! ignore gracefully.

use crate::context::{self, TermMapping};
use crate::error::JsonLdError;
use iref::Iri;
use serde_json::{Map, Value};

/// One resolved `@context` entry: either a known vocabulary (by IRI) or an
/// inline term-definition object mapping compact terms to IRIs.
enum ContextEntry {
    Known(&'static [TermMapping]),
    Inline(Map<String, Value>),
    Unknown,
}

fn parse_context_value(value: &Value) -> Result<Vec<ContextEntry>, JsonLdError> {
    match value {
        Value::String(s) => {
            validate_iri(s)?;
            Ok(vec![context::known_terms(s).map_or(ContextEntry::Unknown, ContextEntry::Known)])
        }
        Value::Object(map) => Ok(vec![ContextEntry::Inline(map.clone())]),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.extend(parse_context_value(item)?);
            }
            Ok(out)
        }
        other => Err(JsonLdError::MalformedContext {
            reason: format!("unexpected @context entry shape: {other}"),
        }),
    }
}

fn validate_iri(s: &str) -> Result<(), JsonLdError> {
    if s.starts_with('@') {
        return Ok(());
    }
    Iri::new(s).map_err(|_| JsonLdError::InvalidIri { iri: s.to_string() })?;
    Ok(())
}

/// Compact a JSON-LD node so that every key this framework understands uses
/// its canonical AS2/`security/v1` term name, regardless of which inline
/// aliases the remote `@context` declared for them.
///
/// # Errors
///
/// Returns [`JsonLdError::MissingContext`] if `document` has no `@context`,
/// and [`JsonLdError::InvalidIri`] if a context entry's IRI is malformed.
pub fn compact_document(document: Value) -> Result<Value, JsonLdError> {
    let Value::Object(mut map) = document else {
        return Err(JsonLdError::NotAnObject);
    };
    let Some(context_value) = map.remove("@context") else {
        return Err(JsonLdError::MissingContext);
    };
    let entries = parse_context_value(&context_value)?;

    // Build an alias -> canonical-term map from inline context overrides:
    // `{"foo": "https://www.w3.org/ns/activitystreams#content"}` means any
    // document key `foo` should be read as `content`.
    let mut aliases: std::collections::HashMap<String, String> = std::collections::HashMap::new();
    for entry in &entries {
        if let ContextEntry::Inline(inline) = entry {
            for (term, def) in inline {
                let iri = match def {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(o) => o.get("@id").and_then(Value::as_str),
                    _ => None,
                };
                if let Some(iri) = iri {
                    for known in entries.iter().filter_map(|e| match e {
                        ContextEntry::Known(terms) => Some(*terms),
                        _ => None,
                    }) {
                        if let Some(canonical) = context::compact_iri(known, iri) {
                            if canonical != term {
                                aliases.insert(term.clone(), canonical.to_string());
                            }
                        }
                    }
                }
            }
        }
    }

    if aliases.is_empty() {
        map.insert("@context".into(), context_value);
        return Ok(Value::Object(map));
    }

    let mut compacted = Map::with_capacity(map.len());
    for (key, value) in map {
        let canonical = aliases.get(&key).cloned().unwrap_or(key);
        compacted.insert(canonical, value);
    }
    compacted.insert("@context".into(), context_value);
    Ok(Value::Object(compacted))
}

/// Strip the `@context` entry and any recognized context-only terms,
/// returning the plain-term document a [`fedi_vocab::Entity`] is decoded
/// from.
///
/// # Errors
///
/// Propagates [`compact_document`]'s errors.
pub fn expand_for_decode(document: Value) -> Result<Value, JsonLdError> {
    let compacted = compact_document(document)?;
    let Value::Object(mut map) = compacted else {
        return Err(JsonLdError::NotAnObject);
    };
    map.remove("@context");
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_context_is_an_error() {
        let err = compact_document(json!({"type": "Note"})).unwrap_err();
        assert!(matches!(err, JsonLdError::MissingContext));
    }

    #[test]
    fn non_object_top_level_is_an_error() {
        let err = compact_document(json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, JsonLdError::NotAnObject));
    }

    #[test]
    fn bare_activitystreams_context_passes_through_unchanged() {
        let doc = json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "type": "Note",
            "content": "hi"
        });
        let out = compact_document(doc.clone()).unwrap();
        assert_eq!(out, doc);
    }

    #[test]
    fn unknown_context_passes_through_unchanged() {
        let doc = json!({
            "@context": "https://example.com/custom/v1",
            "type": "Note"
        });
        let out = compact_document(doc.clone()).unwrap();
        assert_eq!(out, doc);
    }

    #[test]
    fn invalid_iri_in_context_is_rejected() {
        let doc = json!({"@context": "not a valid iri at all", "type": "Note"});
        let err = compact_document(doc).unwrap_err();
        assert!(matches!(err, JsonLdError::InvalidIri { .. }));
    }

    #[test]
    fn inline_alias_is_compacted_to_canonical_term() {
        let doc = json!({
            "@context": [
                "https://www.w3.org/ns/activitystreams",
                {"body": "https://www.w3.org/ns/activitystreams#content"}
            ],
            "type": "Note",
            "body": "hello"
        });
        let out = compact_document(doc).unwrap();
        assert_eq!(out["content"], json!("hello"));
        assert!(out.get("body").is_none());
    }

    #[test]
    fn array_context_combining_as2_and_security_resolves_both() {
        let doc = json!({
            "@context": [
                "https://www.w3.org/ns/activitystreams",
                "https://w3id.org/security/v1",
                {"pk": "https://w3id.org/security#publicKeyPem"}
            ],
            "type": "Person",
            "pk": "-----BEGIN PUBLIC KEY-----..."
        });
        let out = compact_document(doc).unwrap();
        assert_eq!(out["publicKeyPem"], json!("-----BEGIN PUBLIC KEY-----..."));
    }

    #[test]
    fn expand_for_decode_strips_context() {
        let doc = json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "type": "Note",
            "content": "hi"
        });
        let out = expand_for_decode(doc).unwrap();
        assert!(out.get("@context").is_none());
        assert_eq!(out["content"], json!("hi"));
    }
}

//! The built-in `@context` documents this crate understands without a
//! network fetch: the ActivityStreams 2.0 namespace and the `security/v1`
//! vocabulary used by Linked Data Signatures and key discovery.
//!
//! Federated servers routinely publish documents whose `@context` mixes the
//! well-known AS2 IRI with extension vocabularies (Mastodon's `toot:`
//! terms, `misskey:` terms, and so on). This table only needs to resolve
//! the terms [`fedi_vocab::Entity`] accessors read; anything else passes
//! through compaction untouched rather than erroring, which matches how
//! real federated servers tolerate each other's vocabulary extensions.

/// The canonical ActivityStreams 2.0 context IRI.
pub const ACTIVITYSTREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

/// The `security/v1` context IRI used by Linked Data Signatures and
/// `publicKey` discovery.
pub const SECURITY_CONTEXT: &str = "https://w3id.org/security/v1";

/// One `term -> IRI` mapping from a known context document.
#[derive(Debug, Clone, Copy)]
pub struct TermMapping {
    /// The compact term (e.g. `"Note"`, `"sharedInbox"`).
    pub term: &'static str,
    /// The IRI it expands to.
    pub iri: &'static str,
}

/// Term table for [`ACTIVITYSTREAMS_CONTEXT`].
///
/// Not exhaustive against the published AS2 `@context` document — only the
/// terms this framework's [`fedi_vocab::schema::SCHEMA_TABLE`] and
/// [`fedi_vocab::Entity`] accessors reference.
pub const ACTIVITYSTREAMS_TERMS: &[TermMapping] = &[
    TermMapping { term: "id", iri: "@id" },
    TermMapping { term: "type", iri: "@type" },
    TermMapping { term: "actor", iri: "https://www.w3.org/ns/activitystreams#actor" },
    TermMapping { term: "object", iri: "https://www.w3.org/ns/activitystreams#object" },
    TermMapping { term: "target", iri: "https://www.w3.org/ns/activitystreams#target" },
    TermMapping { term: "origin", iri: "https://www.w3.org/ns/activitystreams#origin" },
    TermMapping { term: "result", iri: "https://www.w3.org/ns/activitystreams#result" },
    TermMapping { term: "to", iri: "https://www.w3.org/ns/activitystreams#to" },
    TermMapping { term: "cc", iri: "https://www.w3.org/ns/activitystreams#cc" },
    TermMapping { term: "bto", iri: "https://www.w3.org/ns/activitystreams#bto" },
    TermMapping { term: "bcc", iri: "https://www.w3.org/ns/activitystreams#bcc" },
    TermMapping { term: "audience", iri: "https://www.w3.org/ns/activitystreams#audience" },
    TermMapping { term: "content", iri: "https://www.w3.org/ns/activitystreams#content" },
    TermMapping { term: "name", iri: "https://www.w3.org/ns/activitystreams#name" },
    TermMapping { term: "summary", iri: "https://www.w3.org/ns/activitystreams#summary" },
    TermMapping { term: "published", iri: "https://www.w3.org/ns/activitystreams#published" },
    TermMapping { term: "updated", iri: "https://www.w3.org/ns/activitystreams#updated" },
    TermMapping { term: "url", iri: "https://www.w3.org/ns/activitystreams#url" },
    TermMapping { term: "inbox", iri: "http://www.w3.org/ns/ldp#inbox" },
    TermMapping { term: "outbox", iri: "https://www.w3.org/ns/activitystreams#outbox" },
    TermMapping { term: "following", iri: "https://www.w3.org/ns/activitystreams#following" },
    TermMapping { term: "followers", iri: "https://www.w3.org/ns/activitystreams#followers" },
    TermMapping { term: "preferredUsername", iri: "https://www.w3.org/ns/activitystreams#preferredUsername" },
    TermMapping { term: "items", iri: "https://www.w3.org/ns/activitystreams#items" },
    TermMapping { term: "orderedItems", iri: "https://www.w3.org/ns/activitystreams#items" },
    TermMapping { term: "totalItems", iri: "https://www.w3.org/ns/activitystreams#totalItems" },
    TermMapping { term: "first", iri: "https://www.w3.org/ns/activitystreams#first" },
    TermMapping { term: "last", iri: "https://www.w3.org/ns/activitystreams#last" },
    TermMapping { term: "next", iri: "https://www.w3.org/ns/activitystreams#next" },
    TermMapping { term: "prev", iri: "https://www.w3.org/ns/activitystreams#prev" },
    TermMapping { term: "partOf", iri: "https://www.w3.org/ns/activitystreams#partOf" },
    TermMapping { term: "href", iri: "https://www.w3.org/ns/activitystreams#href" },
    TermMapping { term: "endpoints", iri: "https://www.w3.org/ns/activitystreams#endpoints" },
    TermMapping { term: "sharedInbox", iri: "https://www.w3.org/ns/activitystreams#sharedInbox" },
];

/// Term table for [`SECURITY_CONTEXT`].
pub const SECURITY_TERMS: &[TermMapping] = &[
    TermMapping { term: "publicKey", iri: "https://w3id.org/security#publicKey" },
    TermMapping { term: "publicKeyPem", iri: "https://w3id.org/security#publicKeyPem" },
    TermMapping { term: "owner", iri: "https://w3id.org/security#owner" },
    TermMapping { term: "signature", iri: "https://w3id.org/security#signature" },
    TermMapping { term: "signatureValue", iri: "https://w3id.org/security#signatureValue" },
    TermMapping { term: "proof", iri: "https://w3id.org/security#proof" },
    TermMapping { term: "proofValue", iri: "https://w3id.org/security#proofValue" },
    TermMapping { term: "proofPurpose", iri: "https://w3id.org/security#proofPurpose" },
    TermMapping { term: "verificationMethod", iri: "https://w3id.org/security#verificationMethod" },
    TermMapping { term: "assertionMethod", iri: "https://w3id.org/security#assertionMethod" },
    TermMapping { term: "created", iri: "http://purl.org/dc/terms/created" },
    TermMapping { term: "nonce", iri: "https://w3id.org/security#nonce" },
    TermMapping { term: "cryptosuite", iri: "https://w3id.org/security#cryptosuite" },
];

/// Resolve a known context IRI (or bare name `"activitystreams"`/`"security"`)
/// to its term table, if built in.
#[must_use]
pub fn known_terms(context_iri: &str) -> Option<&'static [TermMapping]> {
    match context_iri {
        ACTIVITYSTREAMS_CONTEXT => Some(ACTIVITYSTREAMS_TERMS),
        SECURITY_CONTEXT => Some(SECURITY_TERMS),
        _ => None,
    }
}

/// Resolve a term to its IRI within a single known context table.
#[must_use]
pub fn expand_term(terms: &[TermMapping], term: &str) -> Option<&'static str> {
    terms.iter().find(|t| t.term == term).map(|t| t.iri)
}

/// Resolve an IRI back to its compact term within a single known context
/// table. Used when compacting a document expanded under a foreign
/// `@context` back into this framework's expected term names.
#[must_use]
pub fn compact_iri(terms: &[TermMapping], iri: &str) -> Option<&'static str> {
    terms.iter().find(|t| t.iri == iri).map(|t| t.term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_terms_resolves_activitystreams() {
        assert!(known_terms(ACTIVITYSTREAMS_CONTEXT).is_some());
    }

    #[test]
    fn known_terms_resolves_security() {
        assert!(known_terms(SECURITY_CONTEXT).is_some());
    }

    #[test]
    fn known_terms_rejects_unknown_context() {
        assert!(known_terms("https://example.com/custom/v1").is_none());
    }

    #[test]
    fn expand_then_compact_roundtrips() {
        let iri = expand_term(ACTIVITYSTREAMS_TERMS, "content").unwrap();
        assert_eq!(compact_iri(ACTIVITYSTREAMS_TERMS, iri), Some("content"));
    }

    #[test]
    fn unknown_term_expands_to_none() {
        assert!(expand_term(ACTIVITYSTREAMS_TERMS, "notARealTerm").is_none());
    }

    #[test]
    fn no_duplicate_terms_within_a_table() {
        for table in [ACTIVITYSTREAMS_TERMS, SECURITY_TERMS] {
            let mut seen = std::collections::HashSet::new();
            for mapping in table {
                assert!(seen.insert(mapping.term), "duplicate term {}", mapping.term);
            }
        }
    }
}

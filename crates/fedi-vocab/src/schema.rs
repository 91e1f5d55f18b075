//! Declarative schema tables the vocabulary types are written against.
//!
//! This is the Rust-idiomatic analogue of the distilled spec's
//! YAML-schema-driven generator: instead of a build-time code generator
//! reading YAML and emitting source files, the schema is a `const` table
//! evaluated at compile time, and [`crate::types`] hand-writes one struct
//! per table entry whose accessors read the table's property list. A unit
//! test below walks the table the same way a generator's validator would:
//! asserting single inheritance resolves without cycles and every property
//! name is unique within its type's ancestry chain.

/// How a property's values are wrapped in JSON-LD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// No special container; plain value or array of values.
    None,
    /// `{"@list": [...]}` — order-preserving.
    List,
    /// Each element wrapped in `{"@graph": ...}`.
    Graph,
}

/// One property declared by a [`TypeSchema`].
#[derive(Debug, Clone, Copy)]
pub struct PropertySchema {
    /// The canonical compact JSON-LD key, used as the Rust-facing property
    /// name too (e.g. `"content"`, `"preferredUsername"`).
    pub name: &'static str,
    /// The fully qualified predicate URI.
    pub uri: &'static str,
    /// `true` if this property holds at most one value.
    pub functional: bool,
    /// The container form used when encoding.
    pub container: Container,
    /// Alternative compact keys accepted for interop with specific
    /// fediverse implementations (and written alongside the canonical key
    /// when functional, per the distilled spec's "redundant siblings").
    pub redundant: &'static [&'static str],
    /// Compact type names this property's value(s) may carry, checked
    /// against a nested object's `type` (a bare IRI reference is always
    /// accepted, since its type isn't known without dereferencing). An
    /// empty slice means no range restriction is enforced.
    pub range: &'static [&'static str],
    /// `true` if a nested object assigned to this property should carry
    /// its own `@context` when the parent is compact-encoded, rather than
    /// relying on the parent's context alone.
    pub embed_context: bool,
}

impl PropertySchema {
    const fn new(name: &'static str, uri: &'static str, functional: bool) -> Self {
        Self { name, uri, functional, container: Container::None, redundant: &[], range: &[], embed_context: false }
    }

    const fn list(mut self) -> Self {
        self.container = Container::List;
        self
    }

    /// Wrap each element in `{"@graph": ...}` when encoding, per the
    /// `graph` container form.
    const fn graph(mut self) -> Self {
        self.container = Container::Graph;
        self
    }

    const fn redundant(mut self, aliases: &'static [&'static str]) -> Self {
        self.redundant = aliases;
        self
    }

    /// Restrict this property's values to the given compact type names (or
    /// their subtypes).
    const fn range(mut self, types: &'static [&'static str]) -> Self {
        self.range = types;
        self
    }

    /// Flag this property's nested object as needing its own embedded
    /// `@context` when compact-encoded.
    const fn embed_context(mut self) -> Self {
        self.embed_context = true;
        self
    }
}

/// `Object` or `Link` — the range most reference-valued AS2 properties
/// admit.
const OBJECT_OR_LINK: &[&str] = &["Object", "Link"];
/// `Image` or `Link` — the range of `icon`.
const IMAGE_OR_LINK: &[&str] = &["Image", "Link"];
/// The two key vocabulary types a `publicKey` entry may be.
const KEY_TYPES: &[&str] = &["CryptographicKey", "Multikey"];

/// One declared vocabulary type: its qualified URI, optional supertype
/// (single inheritance), and property list.
#[derive(Debug, Clone, Copy)]
pub struct TypeSchema {
    /// The Rust/JSON-LD compact type name (e.g. `"Note"`, `"Person"`).
    pub name: &'static str,
    /// The fully qualified type URI.
    pub uri: &'static str,
    /// The compact name of this type's supertype, if any.
    pub extends: Option<&'static str>,
    /// `true` for actor-capable entities exposing `inbox`/`outbox` (used by
    /// [`crate::recipient`] to decide which types implement `Recipient`).
    pub is_actor: bool,
    /// Properties declared directly by this type (not inherited).
    pub properties: &'static [PropertySchema],
}

macro_rules! activity_props {
    () => {
        &[
            PropertySchema::new("actor", "https://www.w3.org/ns/activitystreams#actor", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("object", "https://www.w3.org/ns/activitystreams#object", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("target", "https://www.w3.org/ns/activitystreams#target", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("origin", "https://www.w3.org/ns/activitystreams#origin", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("result", "https://www.w3.org/ns/activitystreams#result", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("instrument", "https://www.w3.org/ns/activitystreams#instrument", false)
                .list()
                .range(OBJECT_OR_LINK),
        ]
    };
}

macro_rules! object_props {
    () => {
        &[
            PropertySchema::new("name", "https://www.w3.org/ns/activitystreams#name", true),
            PropertySchema::new("content", "https://www.w3.org/ns/activitystreams#content", true),
            PropertySchema::new("summary", "https://www.w3.org/ns/activitystreams#summary", true),
            PropertySchema::new("published", "https://www.w3.org/ns/activitystreams#published", true),
            PropertySchema::new("updated", "https://www.w3.org/ns/activitystreams#updated", true),
            PropertySchema::new("url", "https://www.w3.org/ns/activitystreams#url", false)
                .list()
                .range(&["Link"]),
            PropertySchema::new("to", "https://www.w3.org/ns/activitystreams#to", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("cc", "https://www.w3.org/ns/activitystreams#cc", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("bto", "https://www.w3.org/ns/activitystreams#bto", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("bcc", "https://www.w3.org/ns/activitystreams#bcc", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("audience", "https://www.w3.org/ns/activitystreams#audience", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("attachment", "https://www.w3.org/ns/activitystreams#attachment", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("attributedTo", "https://www.w3.org/ns/activitystreams#attributedTo", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("inReplyTo", "https://www.w3.org/ns/activitystreams#inReplyTo", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("icon", "https://www.w3.org/ns/activitystreams#icon", false)
                .list()
                .range(IMAGE_OR_LINK),
            PropertySchema::new("tag", "https://www.w3.org/ns/activitystreams#tag", false)
                .list()
                .range(OBJECT_OR_LINK),
            PropertySchema::new("proof", "https://w3id.org/security#proof", false).graph(),
        ]
    };
}

/// The full set of declared types, base types first (a real generator would
/// topo-sort this; here the literal order already satisfies it, and
/// [`validate_table`] asserts that rather than trusting it silently).
pub static SCHEMA_TABLE: &[TypeSchema] = &[
    TypeSchema {
        name: "Object",
        uri: "https://www.w3.org/ns/activitystreams#Object",
        extends: None,
        is_actor: false,
        properties: object_props!(),
    },
    TypeSchema {
        name: "Link",
        uri: "https://www.w3.org/ns/activitystreams#Link",
        extends: None,
        is_actor: false,
        properties: &[
            PropertySchema::new("href", "https://www.w3.org/ns/activitystreams#href", true),
            PropertySchema::new("rel", "https://www.w3.org/ns/activitystreams#rel", false).list(),
            PropertySchema::new("mediaType", "https://www.w3.org/ns/activitystreams#mediaType", true),
            PropertySchema::new("name", "https://www.w3.org/ns/activitystreams#name", true),
        ],
    },
    TypeSchema {
        name: "Mention",
        uri: "https://www.w3.org/ns/activitystreams#Mention",
        extends: Some("Link"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Note",
        uri: "https://www.w3.org/ns/activitystreams#Note",
        extends: Some("Object"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Image",
        uri: "https://www.w3.org/ns/activitystreams#Image",
        extends: Some("Object"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Place",
        uri: "https://www.w3.org/ns/activitystreams#Place",
        extends: Some("Object"),
        is_actor: false,
        properties: &[
            PropertySchema::new("latitude", "https://www.w3.org/ns/activitystreams#latitude", true),
            PropertySchema::new("longitude", "https://www.w3.org/ns/activitystreams#longitude", true),
            PropertySchema::new("radius", "https://www.w3.org/ns/activitystreams#radius", true),
            PropertySchema::new("units", "https://www.w3.org/ns/activitystreams#units", true),
            PropertySchema::new("altitude", "https://www.w3.org/ns/activitystreams#altitude", true),
        ],
    },
    TypeSchema {
        name: "Activity",
        uri: "https://www.w3.org/ns/activitystreams#Activity",
        extends: Some("Object"),
        is_actor: false,
        properties: activity_props!(),
    },
    TypeSchema {
        name: "Create",
        uri: "https://www.w3.org/ns/activitystreams#Create",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Update",
        uri: "https://www.w3.org/ns/activitystreams#Update",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Delete",
        uri: "https://www.w3.org/ns/activitystreams#Delete",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Follow",
        uri: "https://www.w3.org/ns/activitystreams#Follow",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Accept",
        uri: "https://www.w3.org/ns/activitystreams#Accept",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Reject",
        uri: "https://www.w3.org/ns/activitystreams#Reject",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Undo",
        uri: "https://www.w3.org/ns/activitystreams#Undo",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Announce",
        uri: "https://www.w3.org/ns/activitystreams#Announce",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Like",
        uri: "https://www.w3.org/ns/activitystreams#Like",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Block",
        uri: "https://www.w3.org/ns/activitystreams#Block",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Add",
        uri: "https://www.w3.org/ns/activitystreams#Add",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Remove",
        uri: "https://www.w3.org/ns/activitystreams#Remove",
        extends: Some("Activity"),
        is_actor: false,
        properties: &[],
    },
    TypeSchema {
        name: "Person",
        uri: "https://www.w3.org/ns/activitystreams#Person",
        extends: Some("Object"),
        is_actor: true,
        properties: &[
            PropertySchema::new("preferredUsername", "https://www.w3.org/ns/activitystreams#preferredUsername", true),
            PropertySchema::new("inbox", "http://www.w3.org/ns/ldp#inbox", true),
            PropertySchema::new("outbox", "https://www.w3.org/ns/activitystreams#outbox", true),
            PropertySchema::new("following", "https://www.w3.org/ns/activitystreams#following", true),
            PropertySchema::new("followers", "https://www.w3.org/ns/activitystreams#followers", true),
            PropertySchema::new("liked", "https://www.w3.org/ns/activitystreams#liked", true),
            PropertySchema::new("featured", "https://w3id.org/security#featured", true),
            PropertySchema::new("featuredTags", "https://w3id.org/security#featuredTags", true),
            PropertySchema::new("endpoints", "https://www.w3.org/ns/activitystreams#endpoints", true),
            PropertySchema::new("publicKey", "https://w3id.org/security#publicKey", false)
                .list()
                .range(KEY_TYPES)
                .embed_context(),
            PropertySchema::new("assertionMethod", "https://w3id.org/security#assertionMethod", false)
                .list()
                .range(&["Multikey"]),
        ],
    },
    TypeSchema {
        name: "Application",
        uri: "https://www.w3.org/ns/activitystreams#Application",
        extends: Some("Person"),
        is_actor: true,
        properties: &[],
    },
    TypeSchema {
        name: "Group",
        uri: "https://www.w3.org/ns/activitystreams#Group",
        extends: Some("Person"),
        is_actor: true,
        properties: &[],
    },
    TypeSchema {
        name: "Organization",
        uri: "https://www.w3.org/ns/activitystreams#Organization",
        extends: Some("Person"),
        is_actor: true,
        properties: &[],
    },
    TypeSchema {
        name: "Service",
        uri: "https://www.w3.org/ns/activitystreams#Service",
        extends: Some("Person"),
        is_actor: true,
        properties: &[],
    },
    TypeSchema {
        name: "Collection",
        uri: "https://www.w3.org/ns/activitystreams#Collection",
        extends: Some("Object"),
        is_actor: false,
        properties: &[
            PropertySchema::new("totalItems", "https://www.w3.org/ns/activitystreams#totalItems", true),
            PropertySchema::new("current", "https://www.w3.org/ns/activitystreams#current", true),
            PropertySchema::new("first", "https://www.w3.org/ns/activitystreams#first", true),
            PropertySchema::new("last", "https://www.w3.org/ns/activitystreams#last", true),
            PropertySchema::new("items", "https://www.w3.org/ns/activitystreams#items", false)
                .list()
                .range(OBJECT_OR_LINK),
        ],
    },
    TypeSchema {
        name: "OrderedCollection",
        uri: "https://www.w3.org/ns/activitystreams#OrderedCollection",
        extends: Some("Collection"),
        is_actor: false,
        properties: &[
            PropertySchema::new("orderedItems", "https://www.w3.org/ns/activitystreams#items", false)
                .list()
                .range(OBJECT_OR_LINK),
        ],
    },
    TypeSchema {
        name: "CollectionPage",
        uri: "https://www.w3.org/ns/activitystreams#CollectionPage",
        extends: Some("Collection"),
        is_actor: false,
        properties: &[
            PropertySchema::new("partOf", "https://www.w3.org/ns/activitystreams#partOf", true),
            PropertySchema::new("next", "https://www.w3.org/ns/activitystreams#next", true),
            PropertySchema::new("prev", "https://www.w3.org/ns/activitystreams#prev", true),
            PropertySchema::new("startIndex", "https://www.w3.org/ns/activitystreams#startIndex", true),
        ],
    },
    TypeSchema {
        name: "OrderedCollectionPage",
        uri: "https://www.w3.org/ns/activitystreams#OrderedCollectionPage",
        extends: Some("OrderedCollection"),
        is_actor: false,
        properties: &[
            PropertySchema::new("partOf", "https://www.w3.org/ns/activitystreams#partOf", true),
            PropertySchema::new("next", "https://www.w3.org/ns/activitystreams#next", true),
            PropertySchema::new("prev", "https://www.w3.org/ns/activitystreams#prev", true),
            PropertySchema::new("startIndex", "https://www.w3.org/ns/activitystreams#startIndex", true),
        ],
    },
    TypeSchema {
        name: "CryptographicKey",
        uri: "https://w3id.org/security#Key",
        extends: None,
        is_actor: false,
        properties: &[
            PropertySchema::new("owner", "https://w3id.org/security#owner", true),
            PropertySchema::new("publicKeyPem", "https://w3id.org/security#publicKeyPem", true),
        ],
    },
    TypeSchema {
        name: "Multikey",
        uri: "https://w3id.org/security#Multikey",
        extends: None,
        is_actor: false,
        properties: &[
            PropertySchema::new("controller", "https://w3id.org/security#controller", true),
            PropertySchema::new("publicKeyMultibase", "https://w3id.org/security#publicKeyMultibase", true),
        ],
    },
];

/// Look up a type schema by its compact name.
#[must_use]
pub fn find_type(name: &str) -> Option<&'static TypeSchema> {
    SCHEMA_TABLE.iter().find(|t| t.name == name)
}

/// Look up a type schema by its qualified URI.
#[must_use]
pub fn find_type_by_uri(uri: &str) -> Option<&'static TypeSchema> {
    SCHEMA_TABLE.iter().find(|t| t.uri == uri)
}

/// The maximum number of ancestry hops [`ancestry`] will walk before
/// treating the table as cyclic. The table is `const` and fixed at compile
/// time, so this can only trip in a schema-authoring bug, not from
/// untrusted input.
pub const MAX_ANCESTRY_DEPTH: usize = 32;

/// Returns `name` and every supertype above it, root last.
#[must_use]
pub fn ancestry(name: &str) -> Vec<&'static TypeSchema> {
    let mut out = Vec::new();
    let mut current = find_type(name);
    let mut depth = 0;
    while let Some(schema) = current {
        out.push(schema);
        depth += 1;
        assert!(depth <= MAX_ANCESTRY_DEPTH, "cyclic `extends` chain at {name}");
        current = schema.extends.and_then(find_type);
    }
    out
}

/// `true` if `candidate` is `base` or a (possibly indirect) subtype of it.
#[must_use]
pub fn is_subtype_of(candidate: &str, base: &str) -> bool {
    ancestry(candidate).iter().any(|t| t.name == base)
}

/// All properties visible on `name`, own properties first, then each
/// ancestor's in order.
#[must_use]
pub fn all_properties(name: &str) -> Vec<&'static PropertySchema> {
    ancestry(name).into_iter().flat_map(|t| t.properties.iter()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_extends_edge_resolves() {
        for t in SCHEMA_TABLE {
            if let Some(parent) = t.extends {
                assert!(find_type(parent).is_some(), "{} extends unknown type {parent}", t.name);
            }
        }
    }

    #[test]
    fn no_cycles_in_extends_chain() {
        for t in SCHEMA_TABLE {
            let chain = ancestry(t.name);
            assert!(chain.len() <= MAX_ANCESTRY_DEPTH);
        }
    }

    #[test]
    fn type_names_are_unique() {
        let mut seen = HashSet::new();
        for t in SCHEMA_TABLE {
            assert!(seen.insert(t.name), "duplicate type name {}", t.name);
        }
    }

    #[test]
    fn every_property_name_unique_within_ancestry() {
        for t in SCHEMA_TABLE {
            let props = all_properties(t.name);
            let mut seen = HashSet::new();
            for p in &props {
                assert!(seen.insert(p.name), "{} inherits duplicate property {}", t.name, p.name);
            }
        }
    }

    #[test]
    fn create_is_subtype_of_activity_and_object() {
        assert!(is_subtype_of("Create", "Activity"));
        assert!(is_subtype_of("Create", "Object"));
        assert!(!is_subtype_of("Create", "Link"));
    }

    #[test]
    fn application_is_subtype_of_person() {
        assert!(is_subtype_of("Application", "Person"));
        assert!(is_subtype_of("Application", "Object"));
    }

    #[test]
    fn ordered_collection_page_inherits_items_and_paging_props() {
        let props = all_properties("OrderedCollectionPage");
        let names: HashSet<_> = props.iter().map(|p| p.name).collect();
        assert!(names.contains("orderedItems"));
        assert!(names.contains("next"));
        assert!(names.contains("totalItems"));
    }
}

//! [`Entity`]: the generic property bag every concrete vocabulary type in
//! [`crate::types`] wraps.
//!
//! A hand-generated-from-schema struct per AS2 type would just be a
//! `functional`/`plural` map read through named accessors; this crate writes
//! that struct once (`Entity`) and has [`crate::types`] supply the accessor
//! names and the expected-type checks. Reference properties (`actor`,
//! `object`, `publicKey`, ...) are stored exactly as the document had them —
//! a bare IRI string if unresolved, a full embedded object if the remote
//! server inlined it — and [`Entity::dereference`] resolves the string case
//! through a [`fedi_loader::DocumentLoader`] on demand, memoizing the result
//! so a property read twice only fetches once.

use crate::error::VocabError;
use crate::schema::{self, Container, PropertySchema};
use fedi_loader::DocumentLoader;
use serde_json::{Map, Value};
use std::sync::Mutex;

/// The maximum ancestry/embedding depth [`Entity::from_value`] will walk
/// before treating the document as pathologically (or maliciously) deep.
pub const RECURSION_LIMIT: usize = 64;

/// A decoded vocabulary object: an `id`, a resolved type name, and its
/// properties split into functional (at-most-one-value) and plural
/// (list-valued) groups, plus whatever extension keys the schema doesn't
/// recognize (kept verbatim so round-tripping a document doesn't silently
/// drop unrecognized fediverse extensions).
pub struct Entity {
    id: Option<String>,
    type_name: String,
    functional: std::collections::BTreeMap<String, Value>,
    plural: std::collections::BTreeMap<String, Vec<Value>>,
    extra: Map<String, Value>,
    resolved_cache: Mutex<std::collections::BTreeMap<String, Value>>,
    /// The document this entity was decoded from, before any mutation —
    /// consulted by [`crate::codec::encode`] to return the original bytes
    /// verbatim when the caller asks for no specific format. Cleared by any
    /// setter, since a mutated entity can no longer claim to be the
    /// original document.
    raw: Option<Value>,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("functional", &self.functional)
            .field("plural", &self.plural)
            .field("extra", &self.extra)
            .field("raw", &self.raw)
            .finish()
    }
}

impl Clone for Entity {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            type_name: self.type_name.clone(),
            functional: self.functional.clone(),
            plural: self.plural.clone(),
            extra: self.extra.clone(),
            resolved_cache: Mutex::new(self.resolved_cache.lock().expect("resolved_cache poisoned").clone()),
            raw: self.raw.clone(),
        }
    }
}

impl Entity {
    /// Build a bare reference entity: just an `id`, no type or properties,
    /// as produced when a document contains an unresolved IRI where an
    /// embedded object could have appeared.
    #[must_use]
    pub fn reference(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            type_name: String::new(),
            functional: std::collections::BTreeMap::new(),
            plural: std::collections::BTreeMap::new(),
            extra: Map::new(),
            resolved_cache: Mutex::new(std::collections::BTreeMap::new()),
            raw: None,
        }
    }

    /// Construct an empty entity of a known type, ready for callers to
    /// populate via [`Entity::set_functional`]/[`Entity::set_plural`].
    #[must_use]
    pub fn new(type_name: &str) -> Self {
        Self {
            id: None,
            type_name: type_name.to_string(),
            functional: std::collections::BTreeMap::new(),
            plural: std::collections::BTreeMap::new(),
            extra: Map::new(),
            resolved_cache: Mutex::new(std::collections::BTreeMap::new()),
            raw: None,
        }
    }

    /// Decode a JSON value (already stripped of `@context` and term-aliased
    /// by [`fedi_jsonld::expand_for_decode`]) into an `Entity`.
    ///
    /// # Errors
    ///
    /// Returns [`VocabError::NullDocument`] for `null`, a type-mismatch
    /// error for a top-level scalar/array, and
    /// [`VocabError::FunctionalPropertyConflict`] if a schema-functional
    /// property was given more than one value.
    pub fn from_value(value: Value) -> Result<Self, VocabError> {
        Self::from_value_depth(value, 0)
    }

    fn from_value_depth(value: Value, depth: usize) -> Result<Self, VocabError> {
        if depth > RECURSION_LIMIT {
            return Err(VocabError::RecursionLimitExceeded { limit: RECURSION_LIMIT });
        }
        match value {
            Value::Null => Err(VocabError::NullDocument),
            Value::String(id) => Ok(Self::reference(id)),
            Value::Object(mut map) => {
                let original = Value::Object(map.clone());
                let id = map.remove("id").and_then(|v| v.as_str().map(str::to_string));
                let type_name = extract_type_name(map.remove("type"));
                let schema_props = schema::all_properties(&type_name);

                let mut functional = std::collections::BTreeMap::new();
                let mut plural = std::collections::BTreeMap::new();
                let mut extra = Map::new();

                for (key, raw) in map {
                    match schema_props.iter().find(|p| p.name == key) {
                        Some(prop) if prop.functional => {
                            let resolved = singular_value(prop, raw)?;
                            functional.insert(key, resolved);
                        }
                        Some(prop) => {
                            plural.insert(key, plural_values(prop.container, raw));
                        }
                        None => {
                            extra.insert(key, raw);
                        }
                    }
                }

                Ok(Self {
                    id,
                    type_name,
                    functional,
                    plural,
                    extra,
                    resolved_cache: Mutex::new(std::collections::BTreeMap::new()),
                    raw: Some(original),
                })
            }
            other => Err(VocabError::TypeMismatch { actual: other.to_string(), expected: "object or IRI string" }),
        }
    }

    /// The entity's `id`, if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Set the entity's `id`.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
        self.raw = None;
    }

    /// The resolved compact type name (e.g. `"Note"`), or `""` for a bare
    /// unresolved reference.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// `true` if this entity's type is `expected` or one of its subtypes.
    #[must_use]
    pub fn is_a(&self, expected: &str) -> bool {
        schema::is_subtype_of(&self.type_name, expected)
    }

    /// Read a functional property's raw value.
    #[must_use]
    pub fn get_functional(&self, name: &str) -> Option<&Value> {
        self.functional.get(name)
    }

    /// Read a functional property as a string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get_functional(name).and_then(Value::as_str)
    }

    /// Read a plural property's values (empty slice if absent).
    #[must_use]
    pub fn get_plural(&self, name: &str) -> &[Value] {
        self.plural.get(name).map_or(&[], Vec::as_slice)
    }

    /// Set a functional property.
    pub fn set_functional(&mut self, name: impl Into<String>, value: Value) {
        self.functional.insert(name.into(), value);
        self.raw = None;
    }

    /// Set a plural property.
    ///
    /// # Errors
    ///
    /// Returns [`VocabError::TypeRangeMismatch`] if `name` declares a range
    /// in this entity's schema and one of `values` is an embedded object
    /// whose `type` matches none of it (a bare IRI reference is always
    /// accepted, since its type isn't known without dereferencing).
    pub fn set_plural(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<(), VocabError> {
        let name = name.into();
        if let Some(prop) = schema::all_properties(&self.type_name).iter().find(|p| p.name == name) {
            for value in &values {
                validate_range(prop, value)?;
            }
        }
        self.plural.insert(name, values);
        self.raw = None;
        Ok(())
    }

    /// Extension (schema-unrecognized) properties, verbatim.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// The `id` of a reference-shaped property value: the string itself if
    /// unresolved, or the embedded object's `id` if already inlined.
    #[must_use]
    pub fn prop_id(value: &Value) -> Option<&str> {
        match value {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("id").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Resolve a reference-shaped property value into an `Entity`: decodes
    /// it directly if already embedded, or fetches and memoizes it through
    /// `loader` if it's a bare IRI string.
    ///
    /// # Errors
    ///
    /// Propagates [`VocabError::Dereference`] if the fetch fails, or a
    /// decode error if the fetched document doesn't parse.
    pub async fn dereference(&self, value: &Value, loader: &dyn DocumentLoader) -> Result<Entity, VocabError> {
        match value {
            Value::Object(_) => Entity::from_value(value.clone()),
            Value::String(url) => {
                if let Some(cached) = self.resolved_cache.lock().expect("resolved_cache poisoned").get(url) {
                    return Entity::from_value(cached.clone());
                }
                let remote = loader.load(url).await?;
                let normalized = fedi_jsonld::expand_for_decode(remote.document).unwrap_or_default();
                self.resolved_cache
                    .lock()
                    .expect("resolved_cache poisoned")
                    .insert(url.clone(), normalized.clone());
                Entity::from_value(normalized)
            }
            other => Err(VocabError::TypeMismatch { actual: other.to_string(), expected: "object or IRI string" }),
        }
    }

    /// Encode back to a plain (context-free) JSON value. Callers that need
    /// a full JSON-LD document add `@context` themselves (see
    /// [`crate::codec`]).
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        if let Some(id) = &self.id {
            map.insert("id".into(), Value::String(id.clone()));
        }
        if !self.type_name.is_empty() {
            map.insert("type".into(), Value::String(self.type_name.clone()));
        }
        let schema_props = schema::all_properties(&self.type_name);
        for (name, value) in &self.functional {
            map.insert(name.clone(), value.clone());
            if let Some(prop) = schema_props.iter().find(|p| p.name == name.as_str()) {
                for alias in prop.redundant {
                    map.insert((*alias).to_string(), value.clone());
                }
            }
        }
        for (name, values) in &self.plural {
            let encoded = match schema_props.iter().find(|p| p.name == name.as_str()).map(|p| p.container) {
                Some(Container::List) => Value::Object(Map::from_iter([("@list".to_string(), Value::Array(values.clone()))])),
                Some(Container::Graph) => {
                    let wrapped: Vec<Value> = values
                        .iter()
                        .map(|v| Value::Object(Map::from_iter([("@graph".to_string(), v.clone())])))
                        .collect();
                    match wrapped.len() {
                        1 => wrapped.into_iter().next().expect("len checked"),
                        _ => Value::Array(wrapped),
                    }
                }
                _ if values.len() == 1 => values[0].clone(),
                _ => Value::Array(values.clone()),
            };
            map.insert(name.clone(), encoded);
        }
        Value::Object(map)
    }

    /// The document this entity was decoded from, before any mutation, if
    /// any.
    #[must_use]
    pub fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }

    /// Cache `document` as the original decoded form, consulted by
    /// [`crate::codec::encode`] for verbatim round-tripping.
    pub fn set_raw(&mut self, document: Value) {
        self.raw = Some(document);
    }
}

fn extract_type_name(type_value: Option<Value>) -> String {
    match type_value {
        Some(Value::String(s)) => s,
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .find(|name| schema::find_type(name).is_some())
            .map(str::to_string)
            .or_else(|| items.first().and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Runtime type guard for a polymorphic property's range: a property
/// schema declaring a non-empty `range` only accepts an embedded object
/// whose `type` is one of those names (or a subtype), or a bare IRI
/// reference string, whose type can't be known without dereferencing.
fn validate_range(prop: &PropertySchema, value: &Value) -> Result<(), VocabError> {
    if prop.range.is_empty() {
        return Ok(());
    }
    match value {
        Value::String(_) | Value::Null => Ok(()),
        Value::Object(map) => {
            let type_name = extract_type_name(map.get("type").cloned());
            if type_name.is_empty() || prop.range.iter().any(|member| schema::is_subtype_of(&type_name, member)) {
                Ok(())
            } else {
                Err(VocabError::TypeRangeMismatch { name: prop.name })
            }
        }
        _ => Err(VocabError::TypeRangeMismatch { name: prop.name }),
    }
}

fn singular_value(prop: &PropertySchema, raw: Value) -> Result<Value, VocabError> {
    match raw {
        Value::Array(mut items) => match items.len() {
            0 => Ok(Value::Null),
            1 => Ok(items.pop().expect("len checked")),
            count => Err(VocabError::FunctionalPropertyConflict { name: prop.name, count }),
        },
        other => Ok(other),
    }
}

fn plural_values(container: Container, raw: Value) -> Vec<Value> {
    if container == Container::Graph {
        return unwrap_graph(raw);
    }
    match raw {
        Value::Array(items) => items,
        Value::Object(map) if map.len() == 1 && map.contains_key("@list") => match map.into_iter().next() {
            Some((_, Value::Array(items))) => items,
            Some((_, other)) => vec![other],
            None => Vec::new(),
        },
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Unwrap one `graph`-container value: a single `{"@graph": value}` object,
/// or an array of them.
fn unwrap_graph(raw: Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items.into_iter().map(unwrap_one_graph).collect(),
        Value::Null => Vec::new(),
        other => vec![unwrap_one_graph(other)],
    }
}

fn unwrap_one_graph(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("@graph") => {
            map.remove("@graph").unwrap_or(Value::Null)
        }
        other => other,
    }
}

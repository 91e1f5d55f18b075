//! Concrete ActivityStreams 2.0 / ActivityPub vocabulary types.
//!
//! Each type is a thin, named wrapper around [`Entity`] — the struct itself
//! carries no state beyond the entity it wraps, matching the schema-table
//! design in [`crate::schema`]: a type's shape comes from its
//! [`crate::schema::TypeSchema`] entry, and the wrapper just gives that
//! shape typed, documented accessors. `macro_rules!` generates the
//! boilerplate that's identical across types (construction, `TypedEntity`,
//! `id`), and a handful of property-group macros generate the accessor
//! blocks shared by every type at a given inheritance level (`Object`,
//! `Activity`, actor types).

use crate::base::Entity;
use crate::codec::TypedEntity;
use crate::error::VocabError;
use serde_json::Value;

macro_rules! define_vocab_type {
    ($(#[$doc:meta])* $name:ident, $type_name:literal) => {
        $(#[$doc])*
        pub struct $name(Entity);

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl TypedEntity for $name {
            const TYPE_NAME: &'static str = $type_name;
            fn from_entity(entity: Entity) -> Self {
                Self(entity)
            }
            fn entity(&self) -> &Entity {
                &self.0
            }
            fn entity_mut(&mut self) -> &mut Entity {
                &mut self.0
            }
            fn into_entity(self) -> Entity {
                self.0
            }
        }

        impl $name {
            #[doc = concat!("Construct a new, empty `", stringify!($name), "`.")]
            #[must_use]
            pub fn new() -> Self {
                Self(Entity::new($type_name))
            }

            /// The entity's `id`.
            #[must_use]
            pub fn id(&self) -> Option<&str> {
                self.0.id()
            }

            /// Set the entity's `id`.
            pub fn set_id(&mut self, id: impl Into<String>) {
                self.0.set_id(id);
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

macro_rules! functional_accessor {
    ($getter:ident, $setter:ident, $prop:literal, str) => {
        /// Read the property as a string, if present.
        #[must_use]
        pub fn $getter(&self) -> Option<&str> {
            self.0.get_str($prop)
        }

        #[doc = concat!("Set the `", $prop, "` property.")]
        pub fn $setter(&mut self, value: impl Into<String>) {
            self.0.set_functional($prop, Value::String(value.into()));
        }
    };
    ($getter:ident, $setter:ident, $prop:literal, f64) => {
        /// Read the property as a number, if present.
        #[must_use]
        pub fn $getter(&self) -> Option<f64> {
            self.0.get_functional($prop).and_then(Value::as_f64)
        }

        #[doc = concat!("Set the `", $prop, "` property.")]
        pub fn $setter(&mut self, value: f64) {
            self.0.set_functional($prop, serde_json::json!(value));
        }
    };
}

macro_rules! plural_accessor {
    ($getter:ident, $setter:ident, $prop:literal) => {
        /// Read the property's values (reference strings or embedded
        /// objects, per the document that produced this entity).
        #[must_use]
        pub fn $getter(&self) -> &[Value] {
            self.0.get_plural($prop)
        }

        #[doc = concat!("Set the `", $prop, "` property's values.")]
        ///
        /// # Errors
        ///
        /// Returns [`VocabError::TypeRangeMismatch`] if an embedded
        /// object's `type` doesn't match this property's declared range.
        pub fn $setter(&mut self, values: Vec<Value>) -> Result<(), VocabError> {
            self.0.set_plural($prop, values)
        }
    };
}

/// Shared `Object` properties every AS2 object-family type exposes.
macro_rules! object_accessors {
    ($name:ident) => {
        impl $name {
            functional_accessor!(name, set_name, "name", str);
            functional_accessor!(content, set_content, "content", str);
            functional_accessor!(summary, set_summary, "summary", str);
            functional_accessor!(published, set_published, "published", str);
            functional_accessor!(updated, set_updated, "updated", str);
            plural_accessor!(url, set_url, "url");
            plural_accessor!(to, set_to, "to");
            plural_accessor!(cc, set_cc, "cc");
            plural_accessor!(bto, set_bto, "bto");
            plural_accessor!(bcc, set_bcc, "bcc");
            plural_accessor!(audience, set_audience, "audience");
            plural_accessor!(attachment, set_attachment, "attachment");
            plural_accessor!(attributed_to, set_attributed_to, "attributedTo");
            plural_accessor!(in_reply_to, set_in_reply_to, "inReplyTo");
            plural_accessor!(icon, set_icon, "icon");
            plural_accessor!(tag, set_tag, "tag");
        }
    };
}

/// Shared `Activity` properties (in addition to `Object`'s).
macro_rules! activity_accessors {
    ($name:ident) => {
        object_accessors!($name);
        impl $name {
            plural_accessor!(actor, set_actor, "actor");
            plural_accessor!(object, set_object, "object");
            plural_accessor!(target, set_target, "target");
            plural_accessor!(origin, set_origin, "origin");
            plural_accessor!(result, set_result, "result");
            plural_accessor!(instrument, set_instrument, "instrument");
        }
    };
}

/// Shared actor properties (in addition to `Object`'s).
macro_rules! actor_accessors {
    ($name:ident) => {
        object_accessors!($name);
        impl $name {
            functional_accessor!(preferred_username, set_preferred_username, "preferredUsername", str);
            functional_accessor!(inbox, set_inbox, "inbox", str);
            functional_accessor!(outbox, set_outbox, "outbox", str);
            functional_accessor!(following, set_following, "following", str);
            functional_accessor!(followers, set_followers, "followers", str);
            functional_accessor!(liked, set_liked, "liked", str);
            plural_accessor!(public_key, set_public_key, "publicKey");
            plural_accessor!(assertion_method, set_assertion_method, "assertionMethod");

            /// The actor's `endpoints.sharedInbox`, if the document embeds
            /// an `endpoints` object with that key.
            #[must_use]
            pub fn shared_inbox(&self) -> Option<&str> {
                self.0.get_functional("endpoints")?.get("sharedInbox")?.as_str()
            }
        }
    };
}

// --- Link family -----------------------------------------------------

define_vocab_type!(
    /// An AS2 `Link`: an indirect, qualified reference to another resource.
    Link,
    "Link"
);
impl Link {
    functional_accessor!(href, set_href, "href", str);
    functional_accessor!(media_type, set_media_type, "mediaType", str);
    functional_accessor!(name, set_name, "name", str);
    plural_accessor!(rel, set_rel, "rel");
}

define_vocab_type!(
    /// A `Mention`: a `Link` indicating another actor was mentioned.
    Mention,
    "Mention"
);
impl Mention {
    functional_accessor!(href, set_href, "href", str);
    functional_accessor!(name, set_name, "name", str);
}

// --- Object family -----------------------------------------------------

define_vocab_type!(
    /// The base AS2 `Object` type.
    Object,
    "Object"
);
object_accessors!(Object);

define_vocab_type!(
    /// A short, typically text, status update.
    Note,
    "Note"
);
object_accessors!(Note);

define_vocab_type!(
    /// An image document or resource.
    Image,
    "Image"
);
object_accessors!(Image);

define_vocab_type!(
    /// A physical or logical location.
    Place,
    "Place"
);
object_accessors!(Place);
impl Place {
    functional_accessor!(latitude, set_latitude, "latitude", f64);
    functional_accessor!(longitude, set_longitude, "longitude", f64);
    functional_accessor!(radius, set_radius, "radius", f64);
    functional_accessor!(altitude, set_altitude, "altitude", f64);
    functional_accessor!(units, set_units, "units", str);
}

// --- Activity family -----------------------------------------------------

define_vocab_type!(
    /// The base AS2 `Activity` type.
    Activity,
    "Activity"
);
activity_accessors!(Activity);

macro_rules! define_activity_subtype {
    ($(#[$doc:meta])* $name:ident, $type_name:literal) => {
        define_vocab_type!($(#[$doc])* $name, $type_name);
        activity_accessors!($name);
    };
}

define_activity_subtype!(
    /// Indicates that `actor` created `object`.
    Create,
    "Create"
);
define_activity_subtype!(
    /// Indicates that `actor` updated `object`.
    Update,
    "Update"
);
define_activity_subtype!(
    /// Indicates that `actor` deleted `object`.
    Delete,
    "Delete"
);
define_activity_subtype!(
    /// Indicates that `actor` requested to follow `object`.
    Follow,
    "Follow"
);
define_activity_subtype!(
    /// Indicates that `actor` accepted `object` (often a prior `Follow`).
    Accept,
    "Accept"
);
define_activity_subtype!(
    /// Indicates that `actor` rejected `object`.
    Reject,
    "Reject"
);
define_activity_subtype!(
    /// Indicates that `actor` is undoing a prior activity named in `object`.
    Undo,
    "Undo"
);
define_activity_subtype!(
    /// Indicates that `actor` is calling attention to `object` (a boost).
    Announce,
    "Announce"
);
define_activity_subtype!(
    /// Indicates that `actor` liked `object`.
    Like,
    "Like"
);
define_activity_subtype!(
    /// Indicates that `actor` blocked `object`.
    Block,
    "Block"
);
define_activity_subtype!(
    /// Indicates that `actor` added `object` to `target`.
    Add,
    "Add"
);
define_activity_subtype!(
    /// Indicates that `actor` removed `object` from `target`.
    Remove,
    "Remove"
);

// --- Actor family -----------------------------------------------------

define_vocab_type!(
    /// A human (or human-operated) actor.
    Person,
    "Person"
);
actor_accessors!(Person);

define_vocab_type!(
    /// A software actor (e.g. a bot account).
    Application,
    "Application"
);
actor_accessors!(Application);

define_vocab_type!(
    /// A named, multi-member actor.
    Group,
    "Group"
);
actor_accessors!(Group);

define_vocab_type!(
    /// An organizational actor.
    Organization,
    "Organization"
);
actor_accessors!(Organization);

define_vocab_type!(
    /// A service actor (e.g. a relay or a bridge).
    Service,
    "Service"
);
actor_accessors!(Service);

// --- Collection family -----------------------------------------------------

define_vocab_type!(
    /// An unordered collection of objects or links.
    Collection,
    "Collection"
);
impl Collection {
    functional_accessor!(total_items, set_total_items, "totalItems", f64);
    functional_accessor!(current, set_current, "current", str);
    functional_accessor!(first, set_first, "first", str);
    functional_accessor!(last, set_last, "last", str);
    plural_accessor!(items, set_items, "items");
}

define_vocab_type!(
    /// An ordered collection of objects or links.
    OrderedCollection,
    "OrderedCollection"
);
impl OrderedCollection {
    functional_accessor!(total_items, set_total_items, "totalItems", f64);
    functional_accessor!(first, set_first, "first", str);
    functional_accessor!(last, set_last, "last", str);
    plural_accessor!(ordered_items, set_ordered_items, "orderedItems");
}

define_vocab_type!(
    /// One page of a [`Collection`].
    CollectionPage,
    "CollectionPage"
);
impl CollectionPage {
    functional_accessor!(total_items, set_total_items, "totalItems", f64);
    functional_accessor!(part_of, set_part_of, "partOf", str);
    functional_accessor!(next, set_next, "next", str);
    functional_accessor!(prev, set_prev, "prev", str);
    functional_accessor!(start_index, set_start_index, "startIndex", f64);
    plural_accessor!(items, set_items, "items");
}

define_vocab_type!(
    /// One page of an [`OrderedCollection`].
    OrderedCollectionPage,
    "OrderedCollectionPage"
);
impl OrderedCollectionPage {
    functional_accessor!(total_items, set_total_items, "totalItems", f64);
    functional_accessor!(part_of, set_part_of, "partOf", str);
    functional_accessor!(next, set_next, "next", str);
    functional_accessor!(prev, set_prev, "prev", str);
    functional_accessor!(start_index, set_start_index, "startIndex", f64);
    plural_accessor!(ordered_items, set_ordered_items, "orderedItems");
}

// --- Key vocabulary -----------------------------------------------------

define_vocab_type!(
    /// A legacy `security/v1` RSA public key entry (`publicKey`).
    CryptographicKey,
    "CryptographicKey"
);
impl CryptographicKey {
    functional_accessor!(owner, set_owner, "owner", str);
    functional_accessor!(public_key_pem, set_public_key_pem, "publicKeyPem", str);
}

define_vocab_type!(
    /// A FEP-521a `Multikey` entry (`assertionMethod`), used by Object
    /// Integrity Proofs.
    Multikey,
    "Multikey"
);
impl Multikey {
    functional_accessor!(controller, set_controller, "controller", str);
    functional_accessor!(public_key_multibase, set_public_key_multibase, "publicKeyMultibase", str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use serde_json::json;

    #[test]
    fn place_round_trips_geo_properties() {
        let mut place = Place::new();
        place.set_id("https://example.com/places/1");
        place.set_name("Fediverse HQ");
        place.set_latitude(12.5);
        place.set_longitude(-45.25);
        place.set_radius(10.0);
        place.set_units("km");

        let document = encode(&place);
        let decoded: Place = decode(document).unwrap();

        assert_eq!(decoded.name(), Some("Fediverse HQ"));
        assert_eq!(decoded.latitude(), Some(12.5));
        assert_eq!(decoded.longitude(), Some(-45.25));
        assert_eq!(decoded.radius(), Some(10.0));
        assert_eq!(decoded.units(), Some("km"));
    }

    #[test]
    fn place_round_trips_the_known_answer_document_verbatim() {
        let original = json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "type": "Place",
            "name": "Fresno Area",
            "latitude": 36.75,
            "longitude": 119.7667,
            "radius": 15,
            "units": "miles"
        });

        let place: Place = decode(original.clone()).unwrap();
        assert_eq!(place.name(), Some("Fresno Area"));
        assert_eq!(place.latitude(), Some(36.75));
        assert_eq!(place.longitude(), Some(119.7667));
        assert_eq!(place.radius(), Some(15.0));
        assert_eq!(place.units(), Some("miles"));

        assert_eq!(encode(&place), original);
    }

    #[test]
    fn follow_decodes_as_activity_subtype() {
        let document = json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "type": "Follow",
            "actor": "https://example.com/users/a",
            "object": "https://example.com/users/b"
        });
        let follow: Follow = decode(document).unwrap();
        assert_eq!(follow.actor(), &[json!("https://example.com/users/a")]);
        assert_eq!(follow.object(), &[json!("https://example.com/users/b")]);
    }

    #[test]
    fn person_exposes_shared_inbox_from_endpoints() {
        let document = json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "type": "Person",
            "id": "https://example.com/users/a",
            "inbox": "https://example.com/users/a/inbox",
            "endpoints": {"sharedInbox": "https://example.com/inbox"}
        });
        let person: Person = decode(document).unwrap();
        assert_eq!(person.shared_inbox(), Some("https://example.com/inbox"));
    }

    #[test]
    fn ordered_collection_page_reads_items_and_paging() {
        let document = json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "type": "OrderedCollectionPage",
            "partOf": "https://example.com/users/a/outbox",
            "orderedItems": ["https://example.com/notes/1", "https://example.com/notes/2"],
            "next": "https://example.com/users/a/outbox?page=2"
        });
        let page: OrderedCollectionPage = decode(document).unwrap();
        assert_eq!(page.ordered_items().len(), 2);
        assert_eq!(page.part_of(), Some("https://example.com/users/a/outbox"));
        assert_eq!(page.next(), Some("https://example.com/users/a/outbox?page=2"));
    }
}

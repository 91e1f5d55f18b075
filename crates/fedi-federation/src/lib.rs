#![deny(unsafe_code)]
#![warn(missing_docs)]
//! The federation facade: registers actor, collection, object, inbox, and
//! NodeInfo endpoints against an internal [`fedi_router::Router`], and
//! serves them all from one [`facade::Federation::fetch`] entry point.
//!
//! This crate is the composition root — it owns no protocol logic of its
//! own beyond routing and response shaping, deferring signature
//! verification to `fedi-httpsig`/`fedi-inbox`, collection pagination to
//! `fedi-collection`, delivery to `fedi-outbox`, and WebFinger resolution
//! to `fedi-webfinger`.
//!
//! ```ignore
//! use fedi_federation::facade::Federation;
//!
//! let mut federation = Federation::new(/* ... */);
//! federation.set_actor_dispatcher("/users/{handle}", my_actor_dispatcher)?;
//! federation.set_inbox_listeners("/users/{handle}/inbox", Some("/inbox".into()))?
//!     .on("Follow", my_follow_listener);
//! # Ok::<(), fedi_federation::FederationError>(())
//! ```

/// Registering the actor endpoint, its signing keys, and its WebFinger
/// `acct:` mapping.
pub mod actor;
/// Registering the six paginated collection endpoints.
pub mod collections;
/// [`context::FederationContext`]: the value threaded into every
/// dispatcher and listener call.
pub mod context;
/// Federation facade errors.
pub mod error;
/// [`facade::Federation`]: the registry and HTTP entry point.
pub mod facade;
/// Registering inbox listeners and the authorized-fetch signing key.
pub mod inbox;
/// NodeInfo 2.1 discovery and document serving.
pub mod nodeinfo;
/// Registering per-object URL endpoints.
pub mod object;

pub use actor::{ActorDispatcher, ActorKeyPair, ActorKeyPairsDispatcher, ActorRegistration};
pub use collections::{CollectionKind, CollectionSource};
pub use context::FederationContext;
pub use error::FederationError;
pub use facade::{FallbackHandler, Federation, FetchOptions};
pub use inbox::{InboxRegistration, SharedKey};
pub use nodeinfo::{
    NodeInfo, NodeInfoDiscovery, NodeInfoDispatcher, NodeInfoLink, NodeInfoServices, NodeInfoSoftware, NodeInfoUsage, NodeInfoUsers,
    NODE_INFO_SCHEMA_2_1,
};
pub use object::ObjectDispatcher;

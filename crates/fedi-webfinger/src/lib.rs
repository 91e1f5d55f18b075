#![warn(missing_docs)]
//! RFC 7033 WebFinger: resolving `acct:`/`https:` resources to actor
//! identities, and serving descriptors for local actors.
//!
//! [`client::lookup_webfinger`] is the resolving side, used when this
//! server needs to discover a remote actor by handle.
//! [`server::WebFingerServer`] is the serving side, composed with an
//! [`fedi_router::Router`] and an [`server::ActorDispatcher`] to answer
//! `.well-known/webfinger` for this server's own domain.

/// WebFinger client (`lookup_webfinger`).
pub mod client;
/// WebFinger/server errors.
pub mod error;
/// The JSON Resource Descriptor wire type.
pub mod jrd;
/// WebFinger server (`handle_webfinger`).
pub mod server;

pub use client::lookup_webfinger;
pub use error::WebFingerError;
pub use jrd::{Jrd, JrdLink};
pub use server::{ActorDispatcher, WebFingerServer};

#![warn(missing_docs)]
//! Composes paged dispatchers into `OrderedCollection` / `OrderedCollectionPage`
//! JSON-LD, the shape every ActivityPub collection (outbox, followers,
//! following, liked, featured, featured tags) serves over HTTP.
//!
//! A [`page::CollectionDispatcher`] answers "give me the page at this
//! cursor"; [`endpoint::CollectionEndpoint`] composes that with optional
//! [`page::CollectionCounter`] and [`page::FirstCursorDispatcher`]
//! companions to decide, per request, whether to serve the summary
//! collection or one page of it.

/// Collection composition and authorization errors.
pub mod error;
/// [`endpoint::CollectionEndpoint`], the per-collection composition point.
pub mod endpoint;
/// The dispatcher traits a collection is built from.
pub mod page;

pub use endpoint::CollectionEndpoint;
pub use error::CollectionError;
pub use page::{CollectionAuthorizer, CollectionCounter, CollectionDispatcher, CollectionPage, CollectionRequest, FirstCursorDispatcher};

//! Registering the six paginated collection endpoints an actor can expose:
//! outbox, following, followers, liked, featured, and featured tags.

use crate::context::FederationContext;
use crate::error::FederationError;
use async_trait::async_trait;
use fedi_collection::{CollectionAuthorizer, CollectionCounter, CollectionDispatcher, FirstCursorDispatcher};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Which of the six standard collections a registration serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// An actor's outbox: the activities it has published.
    Outbox,
    /// Who an actor follows.
    Following,
    /// Who follows an actor.
    Followers,
    /// Objects an actor has liked.
    Liked,
    /// Objects an actor has pinned/featured.
    Featured,
    /// Hashtags an actor has featured.
    FeaturedTags,
}

impl CollectionKind {
    /// The router route name this collection registers under.
    #[must_use]
    pub fn route_name(self) -> &'static str {
        match self {
            CollectionKind::Outbox => "collection:outbox",
            CollectionKind::Following => "collection:following",
            CollectionKind::Followers => "collection:followers",
            CollectionKind::Liked => "collection:liked",
            CollectionKind::Featured => "collection:featured",
            CollectionKind::FeaturedTags => "collection:featured_tags",
        }
    }

    /// The inverse of [`CollectionKind::route_name`]: which kind, if any, a
    /// matched route name identifies.
    #[must_use]
    pub fn from_route_name(name: &str) -> Option<Self> {
        match name {
            "collection:outbox" => Some(CollectionKind::Outbox),
            "collection:following" => Some(CollectionKind::Following),
            "collection:followers" => Some(CollectionKind::Followers),
            "collection:liked" => Some(CollectionKind::Liked),
            "collection:featured" => Some(CollectionKind::Featured),
            "collection:featured_tags" => Some(CollectionKind::FeaturedTags),
            _ => None,
        }
    }
}

/// Resolves a collection route's path variables to the dispatcher (and
/// optional counter/first-cursor/authorizer companions) serving it.
///
/// A collection's contents generally belong to whichever actor the route's
/// path variables identify, so the source is re-resolved per request rather
/// than registered once — the same registration serves every actor's
/// outbox, say, not just one.
#[async_trait]
pub trait CollectionSource<C>: Send + Sync {
    /// Resolve the page dispatcher for this request, or `None` if no such
    /// collection exists (e.g. the path variables don't name a real actor).
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::DispatcherFailed`] on a backing-store
    /// failure.
    async fn dispatcher(
        &self,
        context: &FederationContext<C>,
        vars: &BTreeMap<String, String>,
    ) -> Result<Option<Arc<dyn CollectionDispatcher>>, FederationError>;

    /// The counter companion, enabling `totalItems`. Defaults to none.
    async fn counter(
        &self,
        _context: &FederationContext<C>,
        _vars: &BTreeMap<String, String>,
    ) -> Result<Option<Arc<dyn CollectionCounter>>, FederationError> {
        Ok(None)
    }

    /// The first-cursor companion, enabling `first`. Defaults to none.
    async fn first_cursor(
        &self,
        _context: &FederationContext<C>,
        _vars: &BTreeMap<String, String>,
    ) -> Result<Option<Arc<dyn FirstCursorDispatcher>>, FederationError> {
        Ok(None)
    }

    /// The authorizer gating every request to this collection. Defaults to
    /// unrestricted (the public collections: outbox, following, followers,
    /// featured, featured tags). Override for `liked`, which Mastodon-style
    /// deployments typically restrict to the owning actor.
    fn authorizer(&self) -> Option<Arc<dyn CollectionAuthorizer>> {
        None
    }
}

pub(crate) struct CollectionRegistration<C> {
    pub(crate) path: String,
    pub(crate) source: Arc<dyn CollectionSource<C>>,
}

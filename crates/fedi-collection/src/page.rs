//! The [`CollectionDispatcher`] trait and its optional companions.

use crate::error::CollectionError;
use async_trait::async_trait;
use serde_json::Value;

/// One page of a collection, as returned by a [`CollectionDispatcher`] for
/// a given cursor.
#[derive(Debug, Clone, Default)]
pub struct CollectionPage {
    /// The page's items, in the order they should be served.
    pub items: Vec<Value>,
    /// The cursor that would produce the next page, if one exists.
    pub next_cursor: Option<String>,
    /// The cursor that would produce the previous page, if one exists.
    pub prev_cursor: Option<String>,
    /// This page's zero-based offset into the full collection, if the
    /// dispatcher tracks one.
    pub start_index: Option<u64>,
}

/// Serves one page of a collection for a given cursor. `cursor == None`
/// asks for the first page.
#[async_trait]
pub trait CollectionDispatcher: Send + Sync {
    /// Fetch the page for `cursor`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::DispatcherFailed`] on any backing-store
    /// failure.
    async fn page(&self, cursor: Option<&str>) -> Result<CollectionPage, CollectionError>;
}

/// Reports the collection's total item count, for the summary
/// (non-paged) `OrderedCollection` response's `totalItems`.
#[async_trait]
pub trait CollectionCounter: Send + Sync {
    /// The total number of items across all pages.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::DispatcherFailed`] on any backing-store
    /// failure.
    async fn count(&self) -> Result<u64, CollectionError>;
}

/// Supplies the cursor of the first page, for the summary response's
/// `first` link. Without one, `first` is omitted.
#[async_trait]
pub trait FirstCursorDispatcher: Send + Sync {
    /// The cursor identifying the first page, if the collection is
    /// non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::DispatcherFailed`] on any backing-store
    /// failure.
    async fn first_cursor(&self) -> Result<Option<String>, CollectionError>;
}

/// Gates a collection request before any dispatcher runs.
pub trait CollectionAuthorizer: Send + Sync {
    /// Returns `false` to reject the request with
    /// [`CollectionError::Unauthorized`].
    fn authorize(&self, request: &CollectionRequest) -> bool;
}

/// The minimal request context an authorizer needs to make its decision.
#[derive(Debug, Clone, Default)]
pub struct CollectionRequest {
    /// The request's `Authorization` header value, if present.
    pub authorization: Option<String>,
    /// The identity of the actor that signed the request, if the caller
    /// has already resolved one (e.g. via HTTP Signatures).
    pub signed_by: Option<String>,
}

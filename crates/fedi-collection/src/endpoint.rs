//! [`CollectionEndpoint`]: composes a [`CollectionDispatcher`] with its
//! optional counter, first-cursor, and authorizer companions into the
//! three JSON-LD shapes a collection URL can serve.

use crate::error::CollectionError;
use crate::page::{CollectionAuthorizer, CollectionCounter, CollectionDispatcher, CollectionRequest, FirstCursorDispatcher};
use fedi_vocab::types::{OrderedCollection, OrderedCollectionPage};
use fedi_vocab::{encode, TypedEntity};
use serde_json::Value;
use std::sync::Arc;

/// Builds the URL for a given cursor by appending a `cursor` query
/// parameter to the collection's base id. Cursors are expected to already
/// be URL-safe opaque tokens (e.g. base64url or decimal offsets); this
/// crate does not percent-encode them.
fn cursor_url(collection_id: &str, cursor: &str) -> String {
    let separator = if collection_id.contains('?') { '&' } else { '?' };
    format!("{collection_id}{separator}cursor={cursor}")
}

/// Composes dispatchers into collection responses for one collection URL
/// (an actor's inbox, outbox, followers, etc).
pub struct CollectionEndpoint {
    collection_id: String,
    dispatcher: Arc<dyn CollectionDispatcher>,
    counter: Option<Arc<dyn CollectionCounter>>,
    first_cursor: Option<Arc<dyn FirstCursorDispatcher>>,
    authorizer: Option<Arc<dyn CollectionAuthorizer>>,
}

impl CollectionEndpoint {
    /// A new endpoint for `collection_id`, serving pages from `dispatcher`.
    #[must_use]
    pub fn new(collection_id: impl Into<String>, dispatcher: Arc<dyn CollectionDispatcher>) -> Self {
        Self { collection_id: collection_id.into(), dispatcher, counter: None, first_cursor: None, authorizer: None }
    }

    /// Attach a counter dispatcher, enabling `totalItems` on the summary
    /// response.
    #[must_use]
    pub fn with_counter(mut self, counter: Arc<dyn CollectionCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Attach a first-cursor dispatcher, enabling `first` on the summary
    /// response.
    #[must_use]
    pub fn with_first_cursor(mut self, first_cursor: Arc<dyn FirstCursorDispatcher>) -> Self {
        self.first_cursor = Some(first_cursor);
        self
    }

    /// Attach an authorizer gating every request to this collection.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn CollectionAuthorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Serve this collection: the summary `OrderedCollection` when
    /// `cursor` is `None`, or an `OrderedCollectionPage` for the given
    /// cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unauthorized`] if an attached authorizer
    /// rejects `request`, or [`CollectionError::DispatcherFailed`] if a
    /// backing dispatcher errors.
    pub async fn respond(&self, cursor: Option<&str>, request: &CollectionRequest) -> Result<Value, CollectionError> {
        if let Some(authorizer) = &self.authorizer {
            if !authorizer.authorize(request) {
                return Err(CollectionError::Unauthorized);
            }
        }

        match cursor {
            None => self.respond_summary().await,
            Some(cursor) => self.respond_page(cursor).await,
        }
    }

    async fn respond_summary(&self) -> Result<Value, CollectionError> {
        let mut collection = OrderedCollection::new();
        collection.set_id(self.collection_id.clone());

        if let Some(counter) = &self.counter {
            let total = counter.count().await?;
            collection.set_total_items(total as f64);
        }

        if let Some(first_cursor) = &self.first_cursor {
            if let Some(cursor) = first_cursor.first_cursor().await? {
                collection.set_first(cursor_url(&self.collection_id, &cursor));
            }
        }

        Ok(encode(&collection))
    }

    async fn respond_page(&self, cursor: &str) -> Result<Value, CollectionError> {
        let page = self.dispatcher.page(Some(cursor)).await?;

        let mut out = OrderedCollectionPage::new();
        out.set_id(cursor_url(&self.collection_id, cursor));
        out.set_part_of(self.collection_id.clone());
        out.set_ordered_items(page.items)
            .map_err(|e| CollectionError::DispatcherFailed { reason: e.to_string() })?;
        if let Some(next) = page.next_cursor {
            out.set_next(cursor_url(&self.collection_id, &next));
        }
        if let Some(prev) = page.prev_cursor {
            out.set_prev(cursor_url(&self.collection_id, &prev));
        }
        if let Some(start_index) = page.start_index {
            out.set_start_index(start_index as f64);
        }
        if let Some(counter) = &self.counter {
            let total = counter.count().await?;
            out.set_total_items(total as f64);
        }

        Ok(encode(&out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::CollectionPage;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedDispatcher;

    #[async_trait]
    impl CollectionDispatcher for FixedDispatcher {
        async fn page(&self, cursor: Option<&str>) -> Result<CollectionPage, CollectionError> {
            assert_eq!(cursor, Some("2"));
            Ok(CollectionPage {
                items: vec![json!({"type": "Note", "id": "https://example.com/notes/1"})],
                next_cursor: Some("3".into()),
                prev_cursor: Some("1".into()),
                start_index: Some(20),
            })
        }
    }

    struct FixedCounter;

    #[async_trait]
    impl CollectionCounter for FixedCounter {
        async fn count(&self) -> Result<u64, CollectionError> {
            Ok(42)
        }
    }

    struct FixedFirstCursor;

    #[async_trait]
    impl FirstCursorDispatcher for FixedFirstCursor {
        async fn first_cursor(&self) -> Result<Option<String>, CollectionError> {
            Ok(Some("0".into()))
        }
    }

    #[tokio::test]
    async fn summary_response_has_total_items_and_first() {
        let endpoint = CollectionEndpoint::new("https://example.com/users/a/outbox", Arc::new(FixedDispatcher))
            .with_counter(Arc::new(FixedCounter))
            .with_first_cursor(Arc::new(FixedFirstCursor));

        let response = endpoint.respond(None, &CollectionRequest::default()).await.unwrap();
        assert_eq!(response["type"], "OrderedCollection");
        assert_eq!(response["totalItems"], 42.0);
        assert_eq!(response["first"], "https://example.com/users/a/outbox?cursor=0");
        assert!(response.get("orderedItems").is_none());
    }

    #[tokio::test]
    async fn page_response_has_ordered_items_and_links() {
        let endpoint = CollectionEndpoint::new("https://example.com/users/a/outbox", Arc::new(FixedDispatcher));
        let response = endpoint.respond(Some("2"), &CollectionRequest::default()).await.unwrap();
        assert_eq!(response["type"], "OrderedCollectionPage");
        assert_eq!(response["partOf"], "https://example.com/users/a/outbox");
        assert_eq!(response["next"], "https://example.com/users/a/outbox?cursor=3");
        assert_eq!(response["prev"], "https://example.com/users/a/outbox?cursor=1");
        assert_eq!(response["startIndex"], 20.0);
        assert_eq!(response["orderedItems"].as_array().unwrap().len(), 1);
    }

    struct RejectAll;
    impl CollectionAuthorizer for RejectAll {
        fn authorize(&self, _request: &CollectionRequest) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn authorizer_rejection_short_circuits() {
        let endpoint = CollectionEndpoint::new("https://example.com/users/a/outbox", Arc::new(FixedDispatcher))
            .with_authorizer(Arc::new(RejectAll));
        let err = endpoint.respond(None, &CollectionRequest::default()).await.unwrap_err();
        assert!(matches!(err, CollectionError::Unauthorized));
    }
}

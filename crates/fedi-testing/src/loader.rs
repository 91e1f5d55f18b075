//! A [`fedi_loader::DocumentLoader`] backed by an in-memory fixture table
//! instead of real HTTP, for tests that need a dispatcher or listener to
//! dereference a reference property without a network.

use async_trait::async_trait;
use fedi_loader::{DocumentLoader, LoaderError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves documents registered via [`InMemoryDocumentLoader::insert`], and
/// answers every other URL with [`LoaderError::HttpStatus`] (404) — the same
/// failure shape a real loader produces for an absent document, so
/// dispatcher error-handling paths exercise the same branch in tests as in
/// production.
#[derive(Default)]
pub struct InMemoryDocumentLoader {
    documents: Mutex<HashMap<String, Value>>,
}

impl InMemoryDocumentLoader {
    /// An empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document` to be served for `url`. Chainable for fixture
    /// setup: `InMemoryDocumentLoader::new().with_document(id, doc)`.
    #[must_use]
    pub fn with_document(self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    /// Register `document` to be served for `url`, replacing any earlier
    /// registration.
    pub fn insert(&self, url: impl Into<String>, document: Value) {
        self.documents.lock().expect("fixture document table poisoned").insert(url.into(), document);
    }
}

#[async_trait]
impl DocumentLoader for InMemoryDocumentLoader {
    async fn load(&self, url: &str) -> Result<fedi_loader::RemoteDocument, LoaderError> {
        let documents = self.documents.lock().expect("fixture document table poisoned");
        match documents.get(url) {
            Some(document) => {
                Ok(fedi_loader::RemoteDocument { document_url: url.to_string(), context_url: None, document: document.clone() })
            }
            None => Err(LoaderError::HttpStatus { url: url.to_string(), status: 404 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn serves_a_registered_document() {
        let loader = InMemoryDocumentLoader::new().with_document("https://a.example/note/1", json!({"type": "Note"}));
        let document = loader.load("https://a.example/note/1").await.unwrap();
        assert_eq!(document.document["type"], "Note");
    }

    #[tokio::test]
    async fn unregistered_url_is_http_status_404() {
        let loader = InMemoryDocumentLoader::new();
        let err = loader.load("https://a.example/missing").await.unwrap_err();
        assert!(matches!(err, LoaderError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn a_later_insert_replaces_an_earlier_one() {
        let loader = InMemoryDocumentLoader::new();
        loader.insert("https://a.example/note/1", json!({"content": "first"}));
        loader.insert("https://a.example/note/1", json!({"content": "second"}));
        let document = loader.load("https://a.example/note/1").await.unwrap();
        assert_eq!(document.document["content"], "second");
    }
}

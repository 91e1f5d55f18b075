//! End-to-end coverage of [`InboxPipeline::receive`] with a real
//! HTTP-Signature-signed request: accepted on first delivery, suppressed as
//! a duplicate on redelivery.

use async_trait::async_trait;
use fedi_config::InboxConfig;
use fedi_crypto::{generate_key_pair, export_spki, KeyAlgorithm};
use fedi_httpsig::sign_request;
use fedi_inbox::{InboxListener, InboxOutcome, InboxPipeline, ListenerOutcome, ListenerRegistry};
use fedi_loader::{DocumentLoader, InMemoryKvStore, LoaderError, RemoteDocument};
use fedi_vocab::Entity;
use reqwest::header::HeaderMap;
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct StubLoader {
    documents: HashMap<String, Value>,
}

#[async_trait]
impl DocumentLoader for StubLoader {
    async fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        self.documents
            .get(url)
            .cloned()
            .map(|document| RemoteDocument { document_url: url.to_string(), context_url: None, document })
            .ok_or_else(|| LoaderError::HttpStatus { url: url.to_string(), status: 404 })
    }
}

struct CountingListener(Arc<AtomicUsize>);

#[async_trait]
impl InboxListener<()> for CountingListener {
    async fn call(&self, _activity: &Entity, _recipient: Option<&str>, _context: &()) -> Result<ListenerOutcome, String> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(ListenerOutcome::Handled)
    }
}

#[tokio::test]
async fn signed_follow_is_accepted_once_then_deduplicated() {
    let key = generate_key_pair(KeyAlgorithm::Rsa).unwrap();
    let pem = export_spki(&key.public_key()).unwrap();

    let mut documents = HashMap::new();
    documents.insert(
        "https://a.example/users/a".to_string(),
        json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "id": "https://a.example/users/a",
            "type": "Person",
            "publicKey": [{"id": "https://a.example/users/a#main-key"}]
        }),
    );
    documents.insert(
        "https://a.example/users/a#main-key".to_string(),
        json!({
            "@context": ["https://www.w3.org/ns/activitystreams", "https://w3id.org/security/v1"],
            "id": "https://a.example/users/a#main-key",
            "type": "CryptographicKey",
            "owner": "https://a.example/users/a",
            "publicKeyPem": pem
        }),
    );
    let loader: Arc<dyn DocumentLoader> = Arc::new(StubLoader { documents });

    let body = serde_json::to_vec(&json!({
        "@context": "https://www.w3.org/ns/activitystreams",
        "id": "https://a.example/activities/1",
        "type": "Follow",
        "actor": "https://a.example/users/a",
        "object": "https://b.example/users/b"
    }))
    .unwrap();

    let url = Url::parse("https://b.example/users/b/inbox").unwrap();
    let mut headers = HeaderMap::new();
    sign_request("post", &url, &mut headers, Some(&body), &key, "https://a.example/users/a#main-key").unwrap();

    let handled = Arc::new(AtomicUsize::new(0));
    let mut registry: ListenerRegistry<()> = ListenerRegistry::new();
    registry.on("Follow", CountingListener(handled.clone()));

    let pipeline =
        InboxPipeline::new(loader, Arc::new(InMemoryKvStore::new()), &InboxConfig::default(), registry);

    let first = pipeline.receive(&body, "post", "/users/b/inbox", &headers, Some("b"), Arc::new(())).await;
    assert_eq!(first, InboxOutcome::Accepted);
    assert_eq!(handled.load(Ordering::SeqCst), 1);

    let second = pipeline.receive(&body, "post", "/users/b/inbox", &headers, Some("b"), Arc::new(())).await;
    assert_eq!(second, InboxOutcome::Duplicate);
    assert_eq!(handled.load(Ordering::SeqCst), 1, "a duplicate delivery must not re-dispatch to the listener");
}

#[tokio::test]
async fn signed_activity_with_no_registered_listener_is_still_accepted_as_no_listener() {
    let key = generate_key_pair(KeyAlgorithm::Rsa).unwrap();
    let pem = export_spki(&key.public_key()).unwrap();

    let mut documents = HashMap::new();
    documents.insert(
        "https://a.example/users/a".to_string(),
        json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "id": "https://a.example/users/a",
            "type": "Person",
            "publicKey": [{"id": "https://a.example/users/a#main-key"}]
        }),
    );
    documents.insert(
        "https://a.example/users/a#main-key".to_string(),
        json!({
            "@context": ["https://www.w3.org/ns/activitystreams", "https://w3id.org/security/v1"],
            "id": "https://a.example/users/a#main-key",
            "type": "CryptographicKey",
            "owner": "https://a.example/users/a",
            "publicKeyPem": pem
        }),
    );
    let loader: Arc<dyn DocumentLoader> = Arc::new(StubLoader { documents });

    let body = serde_json::to_vec(&json!({
        "@context": "https://www.w3.org/ns/activitystreams",
        "id": "https://a.example/activities/2",
        "type": "Like",
        "actor": "https://a.example/users/a",
        "object": "https://b.example/notes/1"
    }))
    .unwrap();

    let url = Url::parse("https://b.example/users/b/inbox").unwrap();
    let mut headers = HeaderMap::new();
    sign_request("post", &url, &mut headers, Some(&body), &key, "https://a.example/users/a#main-key").unwrap();

    let pipeline = InboxPipeline::new(
        loader,
        Arc::new(InMemoryKvStore::new()),
        &InboxConfig::default(),
        ListenerRegistry::new(),
    );

    let outcome = pipeline.receive(&body, "post", "/users/b/inbox", &headers, Some("b"), Arc::new(())).await;
    assert_eq!(outcome, InboxOutcome::NoListener);
}

//! The base HTTP document loader: SSRF-guarded, TTL-cached, and
//! single-flight across concurrent callers.

use crate::cache::{CacheRule, DocumentCache, RemoteDocument};
use crate::error::LoaderError;
use crate::kv_store::{InMemoryKvStore, KvStore};
use crate::url_policy;
use async_trait::async_trait;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Header value identifying the JSON-LD `Link` relation used to discover an
/// out-of-band `@context` URL.
const JSONLD_CONTEXT_REL: &str = "http://www.w3.org/ns/json-ld#context";

/// Fetches and decodes a remote document, applying the framework's caching
/// and SSRF policy. [`HttpDocumentLoader`] is the concrete implementation;
/// this trait exists so [`crate::authorized::AuthorizedDocumentLoader`] and
/// test mocks can wrap or replace it.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Fetch `url`, consulting and populating the cache.
    async fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError>;
}

/// Build the deterministic `User-Agent` header value: product name,
/// version, and an optional caller-supplied prefix ahead of both.
#[must_use]
pub fn build_user_agent(product: &str, version: &str, caller_prefix: Option<&str>) -> String {
    match caller_prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix} {product}/{version}"),
        _ => format!("{product}/{version}"),
    }
}

/// The default HTTP-backed document loader.
pub struct HttpDocumentLoader {
    client: reqwest::Client,
    cache: DocumentCache,
    user_agent: String,
    allow_private_address: bool,
    timeout_secs: u64,
    in_flight: AsyncMutex<HashMap<String, Arc<tokio::sync::Semaphore>>>,
}

impl HttpDocumentLoader {
    /// Build a loader with an in-memory cache and the given rule list.
    #[must_use]
    pub fn new(user_agent: String, timeout_secs: u64, allow_private_address: bool, rules: Vec<CacheRule>) -> Self {
        Self::with_store(Arc::new(InMemoryKvStore::new()), user_agent, timeout_secs, allow_private_address, rules)
    }

    /// Build a loader over a caller-supplied [`KvStore`].
    #[must_use]
    pub fn with_store(
        store: Arc<dyn KvStore>,
        user_agent: String,
        timeout_secs: u64,
        allow_private_address: bool,
        rules: Vec<CacheRule>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache: DocumentCache::new(store, rules),
            user_agent,
            allow_private_address,
            timeout_secs,
            in_flight: AsyncMutex::new(HashMap::new()),
        }
    }

    async fn fetch_uncached(&self, url: &Url) -> Result<RemoteDocument, LoaderError> {
        url_policy::check_scheme(url)?;
        url_policy::check_url(url, self.allow_private_address).await?;

        let response = tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            self.client
                .get(url.clone())
                .header(reqwest::header::USER_AGENT, &self.user_agent)
                .header(reqwest::header::ACCEPT, "application/activity+json, application/ld+json")
                .send(),
        )
        .await
        .map_err(|_| LoaderError::Timeout { url: url.to_string(), timeout_ms: self.timeout_secs * 1000 })?
        .map_err(|e| LoaderError::ConnectFailure { reason: e.to_string() })?;

        let status = response.status();
        let document_url = response.url().to_string();
        let context_url = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_context_link);

        if !status.is_success() {
            return Err(LoaderError::HttpStatus { url: url.to_string(), status: status.as_u16() });
        }

        let body = response.text().await.map_err(|e| LoaderError::ConnectFailure { reason: e.to_string() })?;
        let document: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| LoaderError::MalformedBody { url: url.to_string(), reason: e.to_string() })?;

        Ok(RemoteDocument { document_url, context_url, document })
    }
}

#[async_trait]
impl DocumentLoader for HttpDocumentLoader {
    async fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        let parsed = Url::parse(url).map_err(|e| LoaderError::InvalidUrl { url: url.to_string(), reason: e.to_string() })?;

        if let Some(cached) = self.cache.get(url).await {
            return Ok(cached);
        }

        // Single-flight: concurrent loads for the same URL share one
        // outstanding fetch rather than issuing parallel requests. A
        // per-URL semaphore with one permit serializes followers behind
        // the first caller; the first caller populates the cache, so
        // followers re-check it after acquiring the permit.
        let sem = {
            let mut table = self.in_flight.lock().await;
            table.entry(url.to_string()).or_insert_with(|| Arc::new(tokio::sync::Semaphore::new(1))).clone()
        };
        let _permit = sem.acquire().await.expect("semaphore never closed");

        if let Some(cached) = self.cache.get(url).await {
            return Ok(cached);
        }

        let document = self.fetch_uncached(&parsed).await?;
        let host = parsed.host_str().unwrap_or_default();
        self.cache.put(url, host, &document).await;

        self.in_flight.lock().await.remove(url);
        Ok(document)
    }
}

fn parse_context_link(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let mut segments = part.split(';');
        let url_part = segments.next()?.trim();
        let url_part = url_part.strip_prefix('<')?.strip_suffix('>')?;
        if segments.any(|s| s.trim() == format!("rel=\"{JSONLD_CONTEXT_REL}\"")) {
            return Some(url_part.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_without_prefix() {
        assert_eq!(build_user_agent("fedify-rs", "0.1.0", None), "fedify-rs/0.1.0");
    }

    #[test]
    fn user_agent_with_prefix() {
        assert_eq!(build_user_agent("fedify-rs", "0.1.0", Some("my-app/2.0")), "my-app/2.0 fedify-rs/0.1.0");
    }

    #[test]
    fn parse_context_link_extracts_matching_rel() {
        let header = format!("<https://example.com/ctx>; rel=\"{JSONLD_CONTEXT_REL}\"");
        assert_eq!(parse_context_link(&header), Some("https://example.com/ctx".to_string()));
    }

    #[test]
    fn parse_context_link_ignores_other_rels() {
        let header = "<https://example.com/other>; rel=\"alternate\"";
        assert_eq!(parse_context_link(header), None);
    }

    #[tokio::test]
    async fn load_rejects_private_address_by_default() {
        let loader = HttpDocumentLoader::new("test/1.0".into(), 5, false, vec![]);
        let err = loader.load("https://127.0.0.1/actor").await.unwrap_err();
        assert!(matches!(err, LoaderError::PrivateAddress { .. }));
    }

    #[tokio::test]
    async fn load_rejects_invalid_url() {
        let loader = HttpDocumentLoader::new("test/1.0".into(), 5, false, vec![]);
        let err = loader.load("not a url").await.unwrap_err();
        assert!(matches!(err, LoaderError::InvalidUrl { .. }));
    }
}

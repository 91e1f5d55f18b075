//! TTL-ruled document caching on top of a [`KvStore`].

use crate::kv_store::KvStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A fetched remote JSON-LD document, along with the metadata ActivityPub's
/// document-loader contract (and `Link: rel="http://www.w3.org/ns/json-ld#context"`
/// discovery) requires callers to see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    /// The final URL after redirects.
    pub document_url: String,
    /// An out-of-band `@context` URL discovered via the `Link` header, if
    /// the response didn't embed one.
    pub context_url: Option<String>,
    /// The decoded JSON body.
    pub document: serde_json::Value,
}

/// One `(pattern, ttl)` rule. The first matching rule in
/// [`DocumentCache`]'s rule list determines a URL's cache TTL.
#[derive(Debug, Clone)]
pub struct CacheRule {
    /// A host suffix to match against the URL's host (e.g. `"example.com"`
    /// matches `"sub.example.com"`), or `"*"` to match any host.
    pub host_suffix: String,
    /// Seconds to cache a match for. `0` disables caching.
    pub ttl_secs: u64,
}

impl CacheRule {
    /// A rule matching every host with the given TTL. Useful as the
    /// catch-all last entry in a rule list.
    #[must_use]
    pub fn catch_all(ttl_secs: u64) -> Self {
        Self { host_suffix: "*".into(), ttl_secs }
    }

    fn matches(&self, host: &str) -> bool {
        self.host_suffix == "*" || host == self.host_suffix || host.ends_with(&format!(".{}", self.host_suffix))
    }
}

/// The default TTL (24 hours) applied when no rule matches and the host is
/// not loopback.
pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

/// Hosts that default to zero TTL (never cached), matching the SSRF-guard
/// loopback set.
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Resolve the TTL that applies to `host` given an ordered rule list.
#[must_use]
pub fn resolve_ttl(rules: &[CacheRule], host: &str) -> u64 {
    if LOOPBACK_HOSTS.contains(&host) {
        return 0;
    }
    rules
        .iter()
        .find(|r| r.matches(host))
        .map_or(DEFAULT_TTL_SECS, |r| r.ttl_secs)
}

/// A TTL-ruled cache for [`RemoteDocument`]s, backed by a [`KvStore`].
pub struct DocumentCache {
    store: Arc<dyn KvStore>,
    rules: Vec<CacheRule>,
}

impl DocumentCache {
    /// Construct a cache over `store` with an ordered rule list. An empty
    /// rule list falls back to [`DEFAULT_TTL_SECS`] for every non-loopback
    /// host.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, rules: Vec<CacheRule>) -> Self {
        Self { store, rules }
    }

    /// Fetch a cached document for `url`, if present and unexpired.
    pub async fn get(&self, url: &str) -> Option<RemoteDocument> {
        let bytes = self.store.get(url).await?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Store `document` under `url`, using the TTL the rule list resolves
    /// for the URL's host.
    pub async fn put(&self, url: &str, host: &str, document: &RemoteDocument) {
        let ttl = resolve_ttl(&self.rules, host);
        if ttl == 0 {
            return;
        }
        if let Ok(bytes) = serde_json::to_vec(document) {
            self.store.set(url, bytes, ttl).await;
        }
    }

    /// Evict a cached entry (e.g. after receiving a `410 Gone` for an
    /// actor).
    pub async fn invalidate(&self, url: &str) {
        self.store.delete(url).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv_store::InMemoryKvStore;

    fn doc(url: &str) -> RemoteDocument {
        RemoteDocument {
            document_url: url.to_string(),
            context_url: None,
            document: serde_json::json!({"type": "Note"}),
        }
    }

    #[test]
    fn loopback_host_always_resolves_zero_ttl() {
        assert_eq!(resolve_ttl(&[CacheRule::catch_all(3600)], "localhost"), 0);
        assert_eq!(resolve_ttl(&[CacheRule::catch_all(3600)], "127.0.0.1"), 0);
    }

    #[test]
    fn empty_rules_falls_back_to_default_ttl() {
        assert_eq!(resolve_ttl(&[], "example.com"), DEFAULT_TTL_SECS);
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![
            CacheRule { host_suffix: "example.com".into(), ttl_secs: 60 },
            CacheRule::catch_all(3600),
        ];
        assert_eq!(resolve_ttl(&rules, "example.com"), 60);
        assert_eq!(resolve_ttl(&rules, "sub.example.com"), 60);
        assert_eq!(resolve_ttl(&rules, "other.com"), 3600);
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let cache = DocumentCache::new(Arc::new(InMemoryKvStore::new()), vec![CacheRule::catch_all(60)]);
        let document = doc("https://example.com/notes/1");
        cache.put("https://example.com/notes/1", "example.com", &document).await;
        assert_eq!(cache.get("https://example.com/notes/1").await, Some(document));
    }

    #[tokio::test]
    async fn loopback_host_is_never_cached() {
        let cache = DocumentCache::new(Arc::new(InMemoryKvStore::new()), vec![CacheRule::catch_all(60)]);
        let document = doc("http://127.0.0.1/actor");
        cache.put("http://127.0.0.1/actor", "127.0.0.1", &document).await;
        assert_eq!(cache.get("http://127.0.0.1/actor").await, None);
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = DocumentCache::new(Arc::new(InMemoryKvStore::new()), vec![CacheRule::catch_all(60)]);
        let document = doc("https://example.com/notes/1");
        cache.put("https://example.com/notes/1", "example.com", &document).await;
        cache.invalidate("https://example.com/notes/1").await;
        assert_eq!(cache.get("https://example.com/notes/1").await, None);
    }
}

//! The pluggable key-value store abstraction backing the document cache.
//!
//! Embedders that already run Redis, sled, or a SQL table for other state
//! implement [`KvStore`] against it; this crate ships only the in-memory
//! default used for tests and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// A minimal async key-value store: get, set-with-expiry, and delete over
/// opaque byte strings.
///
/// Implementations are responsible for honoring `ttl_secs` themselves (by
/// expiring the entry, or relying on the backing store's native TTL
/// support, as Redis does).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a previously stored value, if present and not expired.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key`, expiring after `ttl_secs` seconds.
    /// `ttl_secs == 0` means the entry is not cached at all (store and
    /// immediately forget) — used for loopback/private hosts.
    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64);

    /// Remove a key.
    async fn delete(&self, key: &str);
}

struct Entry {
    value: Vec<u8>,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// An in-memory [`KvStore`] backed by a `Mutex<HashMap>`.
///
/// The default for single-process embedders and the implementation this
/// crate's own tests use.
#[derive(Default)]
pub struct InMemoryKvStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryKvStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including expired-but-not-yet-swept
    /// ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("kv store mutex poisoned").len()
    }

    /// Returns `true` if no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().expect("kv store mutex poisoned");
        match entries.get(key) {
            Some(entry) => {
                if entry.expires_at.is_some_and(|exp| exp <= chrono::Utc::now()) {
                    entries.remove(key);
                    None
                } else {
                    Some(entry.value.clone())
                }
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) {
        if ttl_secs == 0 {
            return;
        }
        let expires_at = Some(chrono::Utc::now() + chrono::Duration::seconds(ttl_secs as i64));
        self.entries
            .lock()
            .expect("kv store mutex poisoned")
            .insert(key.to_string(), Entry { value, expires_at });
    }

    async fn delete(&self, key: &str) {
        self.entries.lock().expect("kv store mutex poisoned").remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let store = InMemoryKvStore::new();
        store.set("k", b"v".to_vec(), 60).await;
        assert_eq!(store.get("k").await, Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn zero_ttl_does_not_persist() {
        let store = InMemoryKvStore::new();
        store.set("k", b"v".to_vec(), 0).await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let store = InMemoryKvStore::new();
        let expires_at = Some(chrono::Utc::now() - chrono::Duration::seconds(1));
        store.entries.lock().unwrap().insert("k".into(), Entry { value: b"v".to_vec(), expires_at });
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let store = InMemoryKvStore::new();
        store.set("k", b"v".to_vec(), 60).await;
        store.delete("k").await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn len_reports_entry_count() {
        let store = InMemoryKvStore::new();
        assert!(store.is_empty());
        store.set("a", b"1".to_vec(), 60).await;
        store.set("b", b"2".to_vec(), 60).await;
        assert_eq!(store.len(), 2);
    }
}

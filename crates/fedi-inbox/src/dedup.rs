//! Suppressing re-delivery of an activity already processed within the
//! configured dedup window.

use fedi_loader::KvStore;
use std::sync::Arc;

const KEY_PREFIX: &str = "fedi-inbox:seen:";

/// Tracks recently-processed activity ids in a [`KvStore`], so a retried or
/// relayed re-delivery of the same activity is accepted (202) without being
/// re-dispatched to a listener.
pub struct InboxDeduplicator {
    store: Arc<dyn KvStore>,
    window_secs: u64,
}

impl InboxDeduplicator {
    /// Build a deduplicator backed by `store`, suppressing re-delivery for
    /// `window_secs` seconds after an id is first seen.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, window_secs: u64) -> Self {
        Self { store, window_secs }
    }

    /// `true` if `activity_id` was already seen within the dedup window.
    /// As a side effect, records the id as seen (whether or not it was a
    /// duplicate) so the window resets from the latest delivery.
    pub async fn is_duplicate(&self, activity_id: &str) -> bool {
        let key = format!("{KEY_PREFIX}{activity_id}");
        let already_seen = self.store.get(&key).await.is_some();
        self.store.set(&key, b"1".to_vec(), self.window_secs).await;
        already_seen
    }
}

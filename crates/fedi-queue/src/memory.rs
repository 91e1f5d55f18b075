//! An in-memory, single-process [`MessageQueue`] built on `tokio::spawn` and
//! `tokio::time::sleep`. Each enqueued message gets its own delay task; this
//! keeps ordering per-message (a later `enqueue` for the same logical job
//! doesn't wait behind an earlier one's delay) at the cost of giving up any
//! global ordering guarantee across different jobs, which matches the
//! outbox pipeline's "unordered across inboxes, self-contained per job"
//! delivery model.

use crate::error::QueueError;
use crate::{MessageHandler, MessageQueue};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// An in-memory [`MessageQueue`]. Messages are lost on process restart;
/// embedders needing durability across restarts should implement
/// [`MessageQueue`] over a persistent store instead.
#[derive(Default)]
pub struct MemoryQueue {
    handler: Arc<Mutex<Option<Arc<dyn MessageHandler>>>>,
}

impl MemoryQueue {
    /// An empty queue with no handler subscribed yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn enqueue(&self, payload: serde_json::Value, delay: Option<Duration>) -> Result<(), QueueError> {
        let handler = self.handler.lock().expect("handler mutex poisoned").clone();
        let Some(handler) = handler else {
            warn!("fedi-queue: message enqueued with no subscribed handler, dropping");
            return Ok(());
        };

        tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Err(err) = handler.handle(payload).await {
                warn!(error = %err, "fedi-queue: handler returned an error, message dropped");
            }
        });
        Ok(())
    }

    fn subscribe(&self, handler: Arc<dyn MessageHandler>) {
        *self.handler.lock().expect("handler mutex poisoned") = Some(handler);
    }
}

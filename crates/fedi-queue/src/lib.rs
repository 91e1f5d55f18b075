#![warn(missing_docs)]
//! A durable message queue abstraction for the outbox delivery pipeline, and
//! a `tokio`-based in-memory implementation ([`memory::MemoryQueue`]) that
//! satisfies the contract for single-process embedders and for this
//! workspace's own test suite.
//!
//! The contract is intentionally small: [`MessageQueue::enqueue`] with an
//! optional delay, and [`MessageQueue::subscribe`] with a handler. Retry
//! scheduling (backoff, attempt counters, terminal failure reporting) is the
//! caller's responsibility — see `fedi-outbox`, which re-enqueues its own
//! job payload with a computed delay on non-2xx delivery. The queue itself
//! only guarantees each enqueued message reaches the subscribed handler at
//! least once.

use async_trait::async_trait;
use std::time::Duration;

/// Errors raised by queue implementations and message handlers.
pub mod error;
/// The in-memory, single-process [`MessageQueue`] implementation.
pub mod memory;

pub use error::QueueError;
pub use memory::MemoryQueue;

/// A message queue that delivers enqueued payloads to a subscribed handler.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueue `payload` for delivery, optionally after `delay`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] if the payload cannot be accepted.
    async fn enqueue(&self, payload: serde_json::Value, delay: Option<Duration>) -> Result<(), QueueError>;

    /// Register the handler invoked for every enqueued message.
    ///
    /// Implementations support exactly one active handler; a later call
    /// replaces an earlier one.
    fn subscribe(&self, handler: std::sync::Arc<dyn MessageHandler>);
}

/// Receives messages dequeued by a [`MessageQueue`].
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one message.
    ///
    /// # Errors
    ///
    /// Returning `Err` only logs; the queue contract does not retry on the
    /// handler's behalf (see the module docs).
    async fn handle(&self, payload: serde_json::Value) -> Result<(), QueueError>;
}

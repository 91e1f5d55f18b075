#![warn(missing_docs)]
//! Outbound delivery pipeline: recipient resolution, inbox-set computation,
//! HTTP-Signature-signed POST, and queue-backed retry with exponential
//! backoff.
//!
//! [`send::send_activity`] is the entry point an embedder's `sendActivity`
//! call reaches: it resolves recipients to actors, folds them into
//! [`inbox_set::InboxTarget`]s, and enqueues one [`job::DeliveryJob`] per
//! inbox onto a [`fedi_queue::MessageQueue`]. [`worker::OutboxWorker`] is
//! the queue-side [`fedi_queue::MessageHandler`] that dequeues those jobs,
//! signs them, and retries on failure per [`job::backoff`].

/// Outbox errors.
pub mod error;
/// Inbox-set computation (`extract_inboxes`).
pub mod inbox_set;
/// [`job::DeliveryJob`] and retry/backoff policy.
pub mod job;
/// `send_activity`: resolve recipients and enqueue delivery jobs.
pub mod send;
/// [`worker::OutboxWorker`]: the queue-side delivery handler.
pub mod worker;

pub use error::OutboxError;
pub use inbox_set::{extract_inboxes, InboxTarget};
pub use job::{backoff, classify_status, DeliveryJob, DeliveryOutcome};
pub use send::{send_activity, SendOptions};
pub use worker::{DeliveryErrorSink, LoggingErrorSink, OutboxWorker, SenderKey, SenderKeyProvider};

//! [`OutboxWorker`]: the [`fedi_queue::MessageHandler`] that dequeues
//! [`DeliveryJob`]s, signs them, and POSTs them to their target inbox,
//! re-enqueuing itself with a computed backoff on a retryable failure.

use crate::error::OutboxError;
use crate::job::{backoff, classify_status, DeliveryJob, DeliveryOutcome};
use async_trait::async_trait;
use fedi_config::DeliveryConfig;
use fedi_crypto::KeyPair;
use fedi_queue::{MessageHandler, MessageQueue, QueueError};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// The signing key material an [`OutboxWorker`] needs for one delivery: the
/// verification method URL (`keyId` in the `Signature` header) and an RSA
/// keypair — HTTP Signatures in this framework are always `rsa-sha256`.
#[derive(Clone)]
pub struct SenderKey {
    /// The `id` of the published key document (e.g.
    /// `https://example.com/users/a#main-key`).
    pub key_id: String,
    /// The signing keypair. Must be [`fedi_crypto::KeyAlgorithm::Rsa`].
    pub pair: Arc<KeyPair>,
}

/// Resolves a local actor id to its first available RSA signing key.
///
/// This is the seam that keeps private key material out of the durable
/// queue: [`DeliveryJob`] carries only `sender_actor_id`, and the worker
/// re-resolves the live key on every attempt (including retries, so a
/// rotated key takes effect immediately).
#[async_trait]
pub trait SenderKeyProvider: Send + Sync {
    /// Resolve `actor_id`'s signing key, or `None` if the actor has no RSA
    /// key (HTTP Signatures can't be produced for an Ed25519-only actor).
    async fn resolve(&self, actor_id: &str) -> Result<Option<SenderKey>, OutboxError>;
}

/// Notified when a job exhausts its retry policy.
#[async_trait]
pub trait DeliveryErrorSink: Send + Sync {
    /// Report a terminally failed delivery, with the job that failed and a
    /// human-readable reason.
    async fn report(&self, job: &DeliveryJob, reason: &str);
}

/// An error sink that only logs via `tracing::error!`. The zero-configuration
/// default; embedders wanting dead-letter storage supply their own
/// [`DeliveryErrorSink`].
pub struct LoggingErrorSink;

#[async_trait]
impl DeliveryErrorSink for LoggingErrorSink {
    async fn report(&self, job: &DeliveryJob, reason: &str) {
        error!(inbox = %job.inbox, activity_id = ?job.activity_id, activity_type = %job.activity_type, attempt = job.attempt, reason, "delivery exhausted its retry policy");
    }
}

/// Delivers [`DeliveryJob`]s dequeued from a [`MessageQueue`].
pub struct OutboxWorker {
    queue: Arc<dyn MessageQueue>,
    keys: Arc<dyn SenderKeyProvider>,
    error_sink: Arc<dyn DeliveryErrorSink>,
    config: DeliveryConfig,
    client: reqwest::Client,
}

impl OutboxWorker {
    /// Build a worker that re-enqueues onto `queue` on retryable failure,
    /// resolves sender keys via `keys`, and follows `config`'s retry policy.
    #[must_use]
    pub fn new(queue: Arc<dyn MessageQueue>, keys: Arc<dyn SenderKeyProvider>, config: DeliveryConfig) -> Self {
        Self::with_error_sink(queue, keys, config, Arc::new(LoggingErrorSink))
    }

    /// As [`OutboxWorker::new`], with a caller-supplied terminal-failure sink.
    #[must_use]
    pub fn with_error_sink(
        queue: Arc<dyn MessageQueue>,
        keys: Arc<dyn SenderKeyProvider>,
        config: DeliveryConfig,
        error_sink: Arc<dyn DeliveryErrorSink>,
    ) -> Self {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build().expect("reqwest client builder cannot fail here");
        Self { queue, keys, error_sink, config, client }
    }

    async fn attempt(&self, job: &DeliveryJob) -> DeliveryOutcome {
        let Some(sender_key) = (match self.keys.resolve(&job.sender_actor_id).await {
            Ok(key) => key,
            Err(err) => {
                warn!(error = %err, actor = %job.sender_actor_id, "sender key provider failed, treating as retryable");
                return DeliveryOutcome::Retry;
            }
        }) else {
            warn!(actor = %job.sender_actor_id, "no RSA signing key available, dropping delivery");
            return DeliveryOutcome::Terminal;
        };

        let Ok(url) = reqwest::Url::parse(&job.inbox) else {
            return DeliveryOutcome::Terminal;
        };
        let Ok(body) = serde_json::to_vec(&job.activity_json) else {
            return DeliveryOutcome::Terminal;
        };

        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::CONTENT_TYPE, "application/activity+json".parse().expect("static content type is valid"));

        if let Err(err) = fedi_httpsig::sign_request("post", &url, &mut headers, Some(&body), sender_key.pair.as_ref(), &sender_key.key_id) {
            warn!(error = %err, "failed to sign delivery request");
            return DeliveryOutcome::Terminal;
        }

        let response = self.client.post(url).headers(headers).body(body).send().await;
        match response {
            Ok(response) => classify_status(response.status().as_u16()),
            Err(err) => {
                warn!(error = %err, inbox = %job.inbox, "delivery request failed");
                DeliveryOutcome::Retry
            }
        }
    }
}

#[async_trait]
impl MessageHandler for OutboxWorker {
    async fn handle(&self, payload: serde_json::Value) -> Result<(), QueueError> {
        let job: DeliveryJob = serde_json::from_value(payload)
            .map_err(|e| QueueError::MalformedJob { reason: e.to_string() })?;

        match self.attempt(&job).await {
            DeliveryOutcome::Success => Ok(()),
            DeliveryOutcome::Terminal => {
                self.error_sink.report(&job, "remote rejected the activity; no retry").await;
                Ok(())
            }
            DeliveryOutcome::Retry => {
                let next_attempt = job.attempt + 1;
                if next_attempt >= self.config.max_retries {
                    self.error_sink.report(&job, "exhausted retry policy").await;
                    return Ok(());
                }
                let mut retried = job;
                retried.attempt = next_attempt;
                let delay = backoff(next_attempt, &self.config);
                let payload = serde_json::to_value(&retried).map_err(|e| QueueError::MalformedJob { reason: e.to_string() })?;
                self.queue.enqueue(payload, Some(delay)).await
            }
        }
    }
}

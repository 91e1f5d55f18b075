//! Errors raised computing inbox sets or delivering outbound activities.

use fedi_error::{ErrorCode, FediError};

/// Errors raised by [`crate::send::send_activity`] and
/// [`crate::worker::OutboxWorker`].
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    /// No RSA key was available for `actor_id`; HTTP Signatures require one
    /// (this framework only signs deliveries with `rsa-sha256`).
    #[error("no RSA signing key available for '{actor_id}'")]
    NoSigningKey {
        /// The sending actor that has no usable key.
        actor_id: String,
    },

    /// A job payload read back off the queue was not shaped as this crate
    /// writes it.
    #[error("malformed delivery job: {reason}")]
    MalformedJob {
        /// Deserialization failure detail.
        reason: String,
    },

    /// The caller-supplied key provider raised an error resolving the
    /// sender's signing key.
    #[error("sender key provider failed: {reason}")]
    KeyProviderFailed {
        /// Failure detail reported by the provider.
        reason: String,
    },

    /// Enqueuing a delivery job onto the message queue failed.
    #[error(transparent)]
    Queue(#[from] fedi_queue::QueueError),
}

impl From<OutboxError> for FediError {
    fn from(err: OutboxError) -> Self {
        let code = match &err {
            OutboxError::NoSigningKey { .. } => ErrorCode::CryptoUnsupportedAlgorithm,
            OutboxError::MalformedJob { .. } => ErrorCode::QueueMalformedJob,
            OutboxError::KeyProviderFailed { .. } => ErrorCode::Internal,
            OutboxError::Queue(fedi_queue::QueueError::MalformedJob { .. }) => ErrorCode::QueueMalformedJob,
            OutboxError::Queue(fedi_queue::QueueError::RetriesExhausted { .. }) => ErrorCode::QueueRetriesExhausted,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

//! Errors raised by queue implementations and message handlers.

use fedi_error::{ErrorCode, FediError};

/// Errors raised enqueueing a message or running a subscribed handler.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The message payload could not be serialized.
    #[error("malformed queue job: {reason}")]
    MalformedJob {
        /// Serialization failure detail.
        reason: String,
    },

    /// A subscribed handler failed to process a message after exhausting
    /// its retry policy.
    #[error("handler failed after exhausting retries: {reason}")]
    RetriesExhausted {
        /// Failure detail reported by the last handler attempt.
        reason: String,
    },
}

impl From<QueueError> for FediError {
    fn from(err: QueueError) -> Self {
        let code = match &err {
            QueueError::MalformedJob { .. } => ErrorCode::QueueMalformedJob,
            QueueError::RetriesExhausted { .. } => ErrorCode::QueueRetriesExhausted,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

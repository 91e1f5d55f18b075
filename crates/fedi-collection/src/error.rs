//! Errors raised composing or authorizing a collection response.

use fedi_error::{ErrorCode, FediError};

/// Errors raised serving a collection or collection page.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// The registered `authorize` predicate rejected the request.
    #[error("request not authorized to read this collection")]
    Unauthorized,

    /// The underlying page, counter, or first-cursor dispatcher failed.
    #[error("collection dispatcher failed: {reason}")]
    DispatcherFailed {
        /// Failure detail reported by the dispatcher.
        reason: String,
    },
}

impl From<CollectionError> for FediError {
    fn from(err: CollectionError) -> Self {
        let code = match &err {
            CollectionError::Unauthorized => ErrorCode::CollectionUnauthorized,
            CollectionError::DispatcherFailed { .. } => ErrorCode::Internal,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

//! Errors raised resolving or serving WebFinger resources.

use fedi_error::{ErrorCode, FediError};

/// Errors raised by [`crate::server::WebFingerServer::handle`].
#[derive(Debug, thiserror::Error)]
pub enum WebFingerError {
    /// The `resource` value wasn't a recognizable `acct:` or `https:` URI,
    /// or its `acct:` host didn't match this server's domain.
    #[error("invalid resource: {resource:?}")]
    InvalidResource {
        /// The offending `resource` value.
        resource: String,
    },

    /// The actor dispatcher raised an error resolving the matched actor.
    #[error("actor dispatcher failed: {reason}")]
    DispatcherFailed {
        /// Failure detail reported by the dispatcher.
        reason: String,
    },
}

impl From<WebFingerError> for FediError {
    fn from(err: WebFingerError) -> Self {
        let code = match &err {
            WebFingerError::InvalidResource { .. } => ErrorCode::WebFingerInvalidResource,
            WebFingerError::DispatcherFailed { .. } => ErrorCode::Internal,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

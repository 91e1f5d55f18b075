//! Errors raised while verifying, deduplicating, or dispatching an inbound
//! activity.

use fedi_error::{ErrorCode, FediError};

/// Errors raised by [`crate::verify::verify_activity`] and
/// [`crate::pipeline::InboxPipeline::receive`].
#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    /// The request body wasn't valid JSON, or didn't decode to an
    /// `Activity` or one of its subtypes.
    #[error("malformed activity: {reason}")]
    MalformedActivity {
        /// Decode failure detail.
        reason: String,
    },

    /// None of the three verification mechanisms accepted the request.
    #[error("no verification mechanism accepted this activity")]
    Unverified,

    /// Proof verification failed at the network layer (as opposed to
    /// simply not verifying).
    #[error(transparent)]
    Proof(#[from] fedi_proof::ProofError),

    /// HTTP Signature verification failed at the network layer.
    #[error(transparent)]
    HttpSig(#[from] fedi_httpsig::HttpSigError),

    /// The registered listener raised an error handling the activity.
    #[error("listener failed handling {activity_type}: {reason}")]
    ListenerFailed {
        /// The activity's runtime type.
        activity_type: String,
        /// Failure detail reported by the listener.
        reason: String,
    },
}

impl From<InboxError> for FediError {
    fn from(err: InboxError) -> Self {
        let code = match &err {
            InboxError::MalformedActivity { .. } => ErrorCode::CodecMalformedDocument,
            InboxError::Unverified => ErrorCode::VerificationMissing,
            InboxError::Proof(_) | InboxError::HttpSig(_) => ErrorCode::VerificationKeyNotOwned,
            InboxError::ListenerFailed { .. } => ErrorCode::DispatchListenerFailed,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

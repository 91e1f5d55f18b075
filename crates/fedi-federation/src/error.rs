use fedi_error::{ErrorCode, FediError};

/// Errors raised while composing or running the federation facade.
///
/// This is deliberately thin: most request-handling failures are absorbed
/// into an HTTP status by [`crate::facade::Federation::fetch`] rather than
/// surfaced here. `FederationError` exists for the embedder-facing
/// dispatcher traits (actor, collection, object, node info) and for the
/// builder's own setup-time checks.
#[derive(Debug, thiserror::Error)]
pub enum FederationError {
    /// A path template collided with one already registered.
    #[error(transparent)]
    Routing(#[from] fedi_router::RouterError),
    /// A collection dispatcher, counter, or authorizer failed.
    #[error(transparent)]
    Collection(#[from] fedi_collection::CollectionError),
    /// WebFinger resolution failed.
    #[error(transparent)]
    WebFinger(#[from] fedi_webfinger::WebFingerError),
    /// An embedder-supplied dispatcher callback failed.
    #[error("dispatcher failed: {reason}")]
    DispatcherFailed {
        /// What the dispatcher was resolving.
        reason: String,
    },
    /// An authorizer rejected the request.
    #[error("unauthorized")]
    Unauthorized,
}

impl From<FederationError> for FediError {
    fn from(err: FederationError) -> Self {
        let code = match &err {
            FederationError::Routing(_) => ErrorCode::RouterNoMatch,
            FederationError::Collection(_) => ErrorCode::CollectionUnauthorized,
            FederationError::WebFinger(_) => ErrorCode::WebFingerInvalidResource,
            FederationError::DispatcherFailed { .. } => ErrorCode::Internal,
            FederationError::Unauthorized => ErrorCode::CollectionUnauthorized,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

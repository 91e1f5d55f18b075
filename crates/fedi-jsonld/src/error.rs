//! Errors raised while resolving and compacting JSON-LD contexts.

use fedi_error::{ErrorCode, FediError};

/// Errors raised by [`crate::compact`] and [`crate::expand`].
#[derive(Debug, thiserror::Error)]
pub enum JsonLdError {
    /// The document had no `@context` entry at all.
    #[error("document has no @context")]
    MissingContext,

    /// A context entry was not a string, a known object form, or an array
    /// of either.
    #[error("malformed @context entry: {reason}")]
    MalformedContext {
        /// Description of the malformed shape.
        reason: String,
    },

    /// A context entry referenced an IRI that failed basic IRI syntax
    /// validation.
    #[error("invalid context IRI '{iri}'")]
    InvalidIri {
        /// The offending value.
        iri: String,
    },

    /// The top-level JSON value was not an object and cannot carry a
    /// `@context`.
    #[error("top-level JSON-LD value must be an object")]
    NotAnObject,
}

impl From<JsonLdError> for FediError {
    fn from(err: JsonLdError) -> Self {
        let code = match &err {
            JsonLdError::MissingContext => ErrorCode::CodecMissingContext,
            JsonLdError::MalformedContext { .. } | JsonLdError::NotAnObject => {
                ErrorCode::CodecMalformedDocument
            }
            JsonLdError::InvalidIri { .. } => ErrorCode::CodecInvalidIri,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_context_maps_to_codec_missing_context() {
        let fedi_err: FediError = JsonLdError::MissingContext.into();
        assert_eq!(fedi_err.code, ErrorCode::CodecMissingContext);
    }

    #[test]
    fn invalid_iri_maps_to_its_own_code() {
        let err = JsonLdError::InvalidIri { iri: "not a url".into() };
        let fedi_err: FediError = err.into();
        assert_eq!(fedi_err.code, ErrorCode::CodecInvalidIri);
    }
}

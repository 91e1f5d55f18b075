//! Errors raised while decoding, encoding, and constructing vocabulary
//! entities.

use fedi_error::{ErrorCode, FediError};

/// Errors raised by [`crate::base::Entity`] construction and
/// [`crate::codec`].
#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    /// The document was JSON `null`, which can never decode to an entity.
    #[error("cannot decode `null` as a vocabulary entity")]
    NullDocument,

    /// The document's `@context`/term compaction failed.
    #[error("JSON-LD normalization failed: {0}")]
    JsonLd(#[from] fedi_jsonld::JsonLdError),

    /// No `type`/`@type` matching a known schema was found.
    #[error("no known vocabulary type matches @type {found:?}; expected one compatible with {expected}")]
    UnknownType {
        /// The `@type` value(s) found in the document.
        found: Vec<String>,
        /// The type the caller asked to decode.
        expected: &'static str,
    },

    /// The decoded `@type` does not name `expected` or one of its subtypes.
    #[error("decoded type {actual} is not {expected} or one of its subtypes")]
    TypeMismatch {
        /// The type actually decoded.
        actual: String,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// A functional (at-most-one-value) property was given more than one
    /// value.
    #[error("property {name:?} is functional but {count} values were supplied")]
    FunctionalPropertyConflict {
        /// The property name.
        name: &'static str,
        /// How many values were supplied.
        count: usize,
    },

    /// Both the singular and plural form of the same property were
    /// supplied to a constructor.
    #[error("property {name:?} was given both a singular and a plural value")]
    SingularPluralConflict {
        /// The property name.
        name: &'static str,
    },

    /// A value did not match any type in the property's declared range.
    #[error("property {name:?} does not accept a value of this shape")]
    TypeRangeMismatch {
        /// The property name.
        name: &'static str,
    },

    /// Recursion depth exceeded while expanding, compacting, or decoding.
    #[error("recursion limit ({limit}) exceeded while processing vocabulary document")]
    RecursionLimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// An unknown property name was requested from a generic accessor.
    #[error("unknown property {0:?} for this type")]
    UnknownProperty(&'static str),

    /// Lazily dereferencing a bare-IRI reference property failed.
    #[error("failed to dereference linked object: {0}")]
    Dereference(#[from] fedi_loader::error::LoaderError),
}

impl From<VocabError> for FediError {
    fn from(err: VocabError) -> Self {
        let code = match &err {
            VocabError::NullDocument
            | VocabError::JsonLd(_)
            | VocabError::UnknownType { .. }
            | VocabError::TypeMismatch { .. }
            | VocabError::UnknownProperty(_) => ErrorCode::CodecMalformedDocument,
            VocabError::FunctionalPropertyConflict { .. } => {
                ErrorCode::CodecFunctionalPropertyConflict
            }
            VocabError::SingularPluralConflict { .. } => ErrorCode::CodecSingularPluralConflict,
            VocabError::TypeRangeMismatch { .. } => ErrorCode::CodecTypeMismatch,
            VocabError::RecursionLimitExceeded { .. } => ErrorCode::CodecRecursionLimitExceeded,
            VocabError::Dereference(_) => ErrorCode::CodecMalformedDocument,
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

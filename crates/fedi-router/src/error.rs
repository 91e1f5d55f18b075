//! Router errors.

use fedi_error::{ErrorCode, FediError};

/// Errors raised while registering or matching routes.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Two templates registered under the same name, or two distinct
    /// templates that match the exact same literal/variable shape.
    #[error("duplicate route template: {0}")]
    DuplicateTemplate(String),

    /// A template string couldn't be parsed (e.g. unbalanced `{`/`}`, two
    /// variables in one path segment).
    #[error("malformed route template {template:?}: {reason}")]
    MalformedTemplate {
        /// The offending template.
        template: String,
        /// Why it was rejected.
        reason: String,
    },

    /// [`crate::Router::build`] was asked for a template name that isn't
    /// registered.
    #[error("unknown route template: {0}")]
    UnknownTemplate(String),

    /// [`crate::Router::build`] was missing a variable the template
    /// requires.
    #[error("template {template:?} requires variable {variable:?}")]
    MissingVariable {
        /// The template being built.
        template: String,
        /// The missing variable name.
        variable: String,
    },
}

impl From<RouterError> for FediError {
    fn from(err: RouterError) -> Self {
        let code = match &err {
            RouterError::DuplicateTemplate(_) | RouterError::MalformedTemplate { .. } => {
                ErrorCode::RouterDuplicateTemplate
            }
            RouterError::UnknownTemplate(_) | RouterError::MissingVariable { .. } => {
                ErrorCode::RouterNoMatch
            }
        };
        let message = err.to_string();
        FediError::new(code, message).with_source(err)
    }
}

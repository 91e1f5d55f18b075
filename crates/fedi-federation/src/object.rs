//! Registering per-object URL endpoints (e.g. `/notes/{id}`) for classes
//! not already covered by the actor or collection endpoints.

use crate::context::FederationContext;
use crate::error::FederationError;
use async_trait::async_trait;
use fedi_vocab::Entity;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Resolves an object route's path variables to the object [`Entity`].
#[async_trait]
pub trait ObjectDispatcher<C>: Send + Sync {
    /// Look up the object.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::DispatcherFailed`] on a backing-store
    /// failure; an absent object is `Ok(None)`, not an error.
    async fn dispatch(&self, context: &FederationContext<C>, vars: &BTreeMap<String, String>) -> Result<Option<Entity>, FederationError>;
}

pub(crate) struct ObjectRegistration<C> {
    pub(crate) class: String,
    pub(crate) path: String,
    pub(crate) dispatcher: Arc<dyn ObjectDispatcher<C>>,
}

impl<C> ObjectRegistration<C> {
    pub(crate) fn route_name(&self) -> String {
        format!("object:{}", self.class)
    }
}

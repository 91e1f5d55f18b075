//! [`FederationContext`]: the value threaded into every dispatcher and
//! listener call.

use fedi_loader::DocumentLoader;
use fedi_queue::MessageQueue;
use fedi_router::Router;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Passed to every registered dispatcher and inbox listener.
///
/// Carries the embedder's own application data (`data`) alongside the
/// shared document loader, delivery queue, and router a dispatcher needs
/// to resolve references or build URLs for other endpoints.
pub struct FederationContext<C> {
    /// This server's own origin, e.g. `"https://example.com"`, with no
    /// trailing slash.
    pub base_url: String,
    /// The embedder's application data, as passed to
    /// [`crate::facade::Federation::create_context`].
    pub data: Arc<C>,
    /// The shared remote document loader.
    pub documents: Arc<dyn DocumentLoader>,
    /// The shared outbound delivery queue.
    pub queue: Arc<dyn MessageQueue>,
    pub(crate) router: Arc<Router>,
}

impl<C> Clone for FederationContext<C> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            data: self.data.clone(),
            documents: self.documents.clone(),
            queue: self.queue.clone(),
            router: self.router.clone(),
        }
    }
}

impl<C> FederationContext<C> {
    /// Build the absolute URL for a registered route, filling in `vars`.
    ///
    /// # Errors
    ///
    /// Returns [`fedi_router::RouterError`] if `route_name` isn't
    /// registered or `vars` is missing a required variable.
    pub fn url_for(&self, route_name: &str, vars: &BTreeMap<String, String>) -> Result<String, fedi_router::RouterError> {
        let path = self.router.build(route_name, vars)?;
        Ok(format!("{}{}", self.base_url, path))
    }
}

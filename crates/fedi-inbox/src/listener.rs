//! Registering and resolving the listener invoked for an inbound
//! activity's runtime type.

use async_trait::async_trait;
use fedi_vocab::{schema, Entity};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Whether a listener's failure should be reported as terminal (202, the
/// default: the embedder already logged or dead-lettered it) or should make
/// the framework retry the delivery (5xx, so the sender's own outbox retry
/// policy takes over).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerOutcome {
    /// Handled; no signal for the sender.
    Handled,
    /// Ask the sender to retry (surfaced to the HTTP layer as a 5xx).
    Retry,
}

/// Invoked once a listener is selected for an inbound activity.
///
/// Implementations receive the decoded [`Entity`] (still carrying its
/// concrete runtime type, e.g. `Follow` even when registered under
/// `Activity`) and the inbox's local identifier the activity was delivered
/// to (a handle or `None` for the shared inbox).
#[async_trait]
pub trait InboxListener<C>: Send + Sync {
    /// Handle one verified, non-duplicate activity.
    ///
    /// # Errors
    ///
    /// Any `Err` is routed to the registered error listener, if any; the
    /// returned [`ListenerOutcome`] (on `Ok`) or the error listener's own
    /// return value decides whether the HTTP response signals retry.
    async fn call(&self, activity: &Entity, recipient: Option<&str>, context: &C) -> Result<ListenerOutcome, String>;
}

type BoxedListener<C> = Arc<dyn InboxListener<C>>;
type BoxedErrorListener<C> =
    Arc<dyn Fn(&str, String, Arc<C>) -> Pin<Box<dyn Future<Output = ListenerOutcome> + Send>> + Send + Sync>;

/// Maps an activity's runtime type to the listener that handles it,
/// falling back to the nearest registered supertype via the vocabulary's
/// single-inheritance `extends` chain (registering under `Activity` itself
/// is a catch-all).
pub struct ListenerRegistry<C> {
    listeners: HashMap<&'static str, BoxedListener<C>>,
    error_listener: Option<BoxedErrorListener<C>>,
}

impl<C> Default for ListenerRegistry<C> {
    fn default() -> Self {
        Self { listeners: HashMap::new(), error_listener: None }
    }
}

impl<C> Clone for ListenerRegistry<C> {
    fn clone(&self) -> Self {
        Self { listeners: self.listeners.clone(), error_listener: self.error_listener.clone() }
    }
}

impl<C> ListenerRegistry<C> {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `type_name` (e.g. `"Follow"` or the
    /// catch-all `"Activity"`). A later call for the same type replaces an
    /// earlier one.
    pub fn on(&mut self, type_name: &'static str, listener: impl InboxListener<C> + 'static) -> &mut Self {
        self.listeners.insert(type_name, Arc::new(listener));
        self
    }

    /// Register the handler invoked when a selected listener's `call`
    /// returns `Err`.
    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&str, String, Arc<C>) -> Pin<Box<dyn Future<Output = ListenerOutcome> + Send>> + Send + Sync + 'static,
    {
        self.error_listener = Some(Arc::new(handler));
        self
    }

    /// Resolve the listener for `activity`'s runtime type: its own type if
    /// registered, else the nearest registered ancestor walked via
    /// [`schema::ancestry`].
    #[must_use]
    pub fn resolve(&self, activity: &Entity) -> Option<&BoxedListener<C>> {
        for schema in schema::ancestry(activity.type_name()) {
            if let Some(listener) = self.listeners.get(schema.name) {
                return Some(listener);
            }
        }
        None
    }

    /// The registered error listener, if any.
    #[must_use]
    pub fn error_listener(&self) -> Option<&BoxedErrorListener<C>> {
        self.error_listener.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl InboxListener<()> for Counting {
        async fn call(&self, _activity: &Entity, _recipient: Option<&str>, _context: &()) -> Result<ListenerOutcome, String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ListenerOutcome::Handled)
        }
    }

    fn follow() -> Entity {
        Entity::from_value(json!({"type": "Follow", "actor": "https://a.example/users/a"})).unwrap()
    }

    #[test]
    fn resolves_exact_type_registration() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry: ListenerRegistry<()> = ListenerRegistry::new();
        registry.on("Follow", Counting(count));
        assert!(registry.resolve(&follow()).is_some());
    }

    #[test]
    fn falls_back_to_supertype_registration() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry: ListenerRegistry<()> = ListenerRegistry::new();
        registry.on("Activity", Counting(count));
        assert!(registry.resolve(&follow()).is_some());
    }

    #[test]
    fn no_match_when_nothing_registered() {
        let registry: ListenerRegistry<()> = ListenerRegistry::new();
        assert!(registry.resolve(&follow()).is_none());
    }

    #[test]
    fn exact_type_takes_priority_over_supertype() {
        let exact = Arc::new(AtomicUsize::new(0));
        let general = Arc::new(AtomicUsize::new(0));
        let mut registry: ListenerRegistry<()> = ListenerRegistry::new();
        registry.on("Activity", Counting(general));
        registry.on("Follow", Counting(exact.clone()));
        let resolved = registry.resolve(&follow());
        assert!(resolved.is_some());
    }
}

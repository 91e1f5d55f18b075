//! Registering inbox listeners and, optionally, the key pair used to sign
//! authorized (HTTP-signed) fetches this server makes on its own behalf.

use crate::context::FederationContext;
use fedi_crypto::KeyPair;
use fedi_inbox::{InboxListener, ListenerOutcome, ListenerRegistry};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The keypair used to sign this server's own outbound GETs when a remote
/// server runs in authorized-fetch mode.
///
/// Unlike [`crate::actor::ActorKeyPairsDispatcher`], this is a single fixed
/// identity representing the server itself (often the instance actor)
/// rather than a per-handle lookup.
pub struct SharedKey {
    /// The published key document's `id`.
    pub key_id: String,
    /// The signing keypair. Must be [`fedi_crypto::KeyAlgorithm::Rsa`]
    /// (HTTP Signatures in this framework are always `rsa-sha256`).
    pub pair: Arc<KeyPair>,
}

/// The inbox endpoint's full registration: the listener registry plus the
/// optional shared signing key for authorized fetch.
pub struct InboxRegistration<C> {
    pub(crate) path: String,
    pub(crate) shared_path: Option<String>,
    pub(crate) listeners: ListenerRegistry<FederationContext<C>>,
    pub(crate) shared_key: Option<SharedKey>,
}

impl<C: Send + Sync> InboxRegistration<C> {
    pub(crate) fn new(path: impl Into<String>, shared_path: Option<String>) -> Self {
        Self { path: path.into(), shared_path, listeners: ListenerRegistry::new(), shared_key: None }
    }

    /// Register `listener` for activities of runtime type `type_name` (or
    /// any of its supertypes via the nearest registered ancestor).
    pub fn on(&mut self, type_name: &'static str, listener: impl InboxListener<FederationContext<C>> + 'static) -> &mut Self {
        self.listeners.on(type_name, listener);
        self
    }

    /// Register the handler invoked when a selected listener's `call`
    /// returns `Err`.
    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&str, String, Arc<FederationContext<C>>) -> Pin<Box<dyn Future<Output = ListenerOutcome> + Send>> + Send + Sync + 'static,
    {
        self.listeners.on_error(handler);
        self
    }

    /// Provide the key this server signs its own authorized fetches with.
    pub fn set_shared_key_dispatcher(&mut self, shared_key: SharedKey) -> &mut Self {
        self.shared_key = Some(shared_key);
        self
    }
}

//! Registering the actor endpoint: the actor document itself, its signing
//! keys, and the WebFinger `acct:` mapping for it.

use crate::context::FederationContext;
use crate::error::FederationError;
use async_trait::async_trait;
use fedi_crypto::KeyAlgorithm;
use fedi_crypto::KeyPair;
use fedi_vocab::Entity;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Resolves the actor route's captured path variables (e.g. `{handle}`) to
/// an actor [`Entity`], or `None` if no such actor exists.
#[async_trait]
pub trait ActorDispatcher<C>: Send + Sync {
    /// Look up the actor.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::DispatcherFailed`] on a backing-store
    /// failure; an absent actor is `Ok(None)`, not an error.
    async fn dispatch(&self, context: &FederationContext<C>, vars: &BTreeMap<String, String>) -> Result<Option<Entity>, FederationError>;
}

/// One signing keypair published on an actor's `publicKey`/`assertionMethod`
/// and available to the outbox worker for signing deliveries on that
/// actor's behalf.
pub struct ActorKeyPair {
    /// The key algorithm.
    pub algorithm: KeyAlgorithm,
    /// The published key document's `id` (the HTTP Signature `keyId`).
    pub key_id: String,
    /// The private keypair.
    pub pair: Arc<KeyPair>,
}

/// Resolves an actor identifier to its signing keypairs.
///
/// Kept separate from [`ActorDispatcher`] because the actor document itself
/// (what gets served over HTTP) and the private key material backing it
/// (what the outbox worker needs, and what never leaves the process) have
/// different audiences.
#[async_trait]
pub trait ActorKeyPairsDispatcher<C>: Send + Sync {
    /// Resolve `identifier`'s (the router-captured handle, not a full IRI)
    /// signing keypairs, in the order they were generated.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::DispatcherFailed`] on a backing-store
    /// failure. An identifier with no keys yet is `Ok(vec![])`.
    async fn dispatch(&self, context: &FederationContext<C>, identifier: &str) -> Result<Vec<ActorKeyPair>, FederationError>;
}

type AcctMapper = Arc<dyn Fn(&str) -> BTreeMap<String, String> + Send + Sync>;
type ActorAuthorizer = Arc<dyn Fn(&BTreeMap<String, String>) -> bool + Send + Sync>;

/// The actor endpoint's full registration: its dispatcher plus the
/// optional companions chained off `set_actor_dispatcher`.
pub struct ActorRegistration<C> {
    pub(crate) path: String,
    pub(crate) dispatcher: Arc<dyn ActorDispatcher<C>>,
    pub(crate) key_pairs: Option<Arc<dyn ActorKeyPairsDispatcher<C>>>,
    pub(crate) acct_vars: Option<AcctMapper>,
    pub(crate) authorizer: Option<ActorAuthorizer>,
}

impl<C> ActorRegistration<C> {
    pub(crate) fn new(path: impl Into<String>, dispatcher: Arc<dyn ActorDispatcher<C>>) -> Self {
        Self { path: path.into(), dispatcher, key_pairs: None, acct_vars: None, authorizer: None }
    }

    /// Register where this actor's private signing keys come from.
    pub fn set_key_pairs_dispatcher(&mut self, dispatcher: impl ActorKeyPairsDispatcher<C> + 'static) -> &mut Self {
        self.key_pairs = Some(Arc::new(dispatcher));
        self
    }

    /// Accept `acct:user@domain` WebFinger lookups, turning the local part
    /// into this route's path variables via `mapper`.
    pub fn map_handle(&mut self, mapper: impl Fn(&str) -> BTreeMap<String, String> + Send + Sync + 'static) -> &mut Self {
        self.acct_vars = Some(Arc::new(mapper));
        self
    }

    /// Gate every request to this actor's endpoint (not its collections,
    /// which carry their own authorizers) behind `predicate`.
    pub fn authorize(&mut self, predicate: impl Fn(&BTreeMap<String, String>) -> bool + Send + Sync + 'static) -> &mut Self {
        self.authorizer = Some(Arc::new(predicate));
        self
    }
}

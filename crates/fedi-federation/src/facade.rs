//! [`Federation`]: the registry and single HTTP entry point composing the
//! router, WebFinger, NodeInfo, collections, and the inbox/outbox
//! pipelines into one ActivityPub server.

use crate::actor::{ActorDispatcher, ActorKeyPairsDispatcher, ActorRegistration};
use crate::collections::{CollectionKind, CollectionRegistration, CollectionSource};
use crate::context::FederationContext;
use crate::error::FederationError;
use crate::inbox::InboxRegistration;
use crate::nodeinfo::{NodeInfo, NodeInfoDiscovery, NodeInfoDispatcher, NodeInfoLink, NODE_INFO_SCHEMA_2_1};
use crate::object::{ObjectDispatcher, ObjectRegistration};
use async_trait::async_trait;
use axum::http::{HeaderMap, Method, Request, Response, StatusCode};
use fedi_collection::{CollectionEndpoint, CollectionRequest};
use fedi_config::{DeliveryConfig, InboxConfig};
use fedi_inbox::{InboxOutcome, InboxPipeline};
use fedi_jsonld::{ACTIVITYSTREAMS_CONTEXT, SECURITY_CONTEXT};
use fedi_loader::{DocumentLoader, KvStore};
use fedi_outbox::{OutboxError, OutboxWorker, SenderKey, SenderKeyProvider};
use fedi_queue::MessageQueue;
use fedi_router::Router;
use fedi_vocab::Entity;
use fedi_webfinger::WebFingerServer;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use tracing::warn;

const AS2_CONTENT_TYPE: &str = "application/activity+json";
const NODE_INFO_CONTENT_TYPE: &str = r#"application/json; profile="http://nodeinfo.diaspora.software/ns/schema/2.1#""#;
const JRD_CONTENT_TYPE: &str = "application/jrd+json";
const WELL_KNOWN_WEBFINGER: &str = "/.well-known/webfinger";
const WELL_KNOWN_NODEINFO: &str = "/.well-known/nodeinfo";

const SECURITY_TERMS: &[&str] =
    &["publicKey", "publicKeyPem", "owner", "assertionMethod", "publicKeyMultibase", "controller", "proof", "signature"];

/// Invoked by [`Federation::fetch`] when it has no registration to satisfy
/// a request (unmatched route, absent resource, rejected content
/// negotiation, or failed authorization) and hands the request back to the
/// embedder for a custom response.
pub type FallbackHandler =
    Arc<dyn Fn(Request<Vec<u8>>) -> Pin<Box<dyn Future<Output = Response<Vec<u8>>> + Send>> + Send + Sync>;

/// Per-request knobs for [`Federation::fetch`].
pub struct FetchOptions<C> {
    /// The embedder's application data, threaded into every dispatcher
    /// call via the built [`FederationContext`].
    pub context_data: Arc<C>,
    on_not_found: Option<FallbackHandler>,
    on_not_acceptable: Option<FallbackHandler>,
    on_unauthorized: Option<FallbackHandler>,
}

impl<C> FetchOptions<C> {
    /// Start with no fallbacks registered; every unsatisfied request gets
    /// a bare status code with no body.
    #[must_use]
    pub fn new(context_data: Arc<C>) -> Self {
        Self { context_data, on_not_found: None, on_not_acceptable: None, on_unauthorized: None }
    }

    /// Handle requests for a route or resource this federation has no
    /// registration for.
    #[must_use]
    pub fn on_not_found(mut self, handler: FallbackHandler) -> Self {
        self.on_not_found = Some(handler);
        self
    }

    /// Handle an actor/object GET whose `Accept` header prefers HTML over
    /// any JSON-LD variant this crate serves (e.g. a browser navigating to
    /// a profile URL).
    #[must_use]
    pub fn on_not_acceptable(mut self, handler: FallbackHandler) -> Self {
        self.on_not_acceptable = Some(handler);
        self
    }

    /// Handle a request an actor or collection authorizer rejected.
    #[must_use]
    pub fn on_unauthorized(mut self, handler: FallbackHandler) -> Self {
        self.on_unauthorized = Some(handler);
        self
    }
}

/// The registry and HTTP entry point for one federated server.
///
/// Built up with the `set_*` methods (each registering a path with the
/// internal [`Router`]), then served by calling [`Federation::fetch`] for
/// every incoming request — typically from inside an embedder's own
/// `axum::Router` fallback or a dedicated nest. Built on `axum::http`
/// request/response types so the facade composes directly into an
/// embedder's own router without a translation layer.
pub struct Federation<C> {
    base_url: String,
    router: Router,
    documents: Arc<dyn DocumentLoader>,
    queue: Arc<dyn MessageQueue>,
    dedup_store: Arc<dyn KvStore>,
    inbox_config: InboxConfig,
    delivery_config: DeliveryConfig,
    actor: Option<ActorRegistration<C>>,
    objects: Vec<ObjectRegistration<C>>,
    collections: HashMap<CollectionKind, CollectionRegistration<C>>,
    inbox: Option<InboxRegistration<C>>,
    node_info_path: Option<String>,
    node_info: Option<Arc<dyn NodeInfoDispatcher<C>>>,
    inbox_pipeline: OnceLock<Arc<InboxPipeline<FederationContext<C>>>>,
}

impl<C: Send + Sync + 'static> Federation<C> {
    /// Start an empty federation serving `base_url` (e.g.
    /// `"https://example.com"`, no trailing slash).
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        documents: Arc<dyn DocumentLoader>,
        queue: Arc<dyn MessageQueue>,
        dedup_store: Arc<dyn KvStore>,
        inbox_config: InboxConfig,
        delivery_config: DeliveryConfig,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            router: Router::new(),
            documents,
            queue,
            dedup_store,
            inbox_config,
            delivery_config,
            actor: None,
            objects: Vec::new(),
            collections: HashMap::new(),
            inbox: None,
            node_info_path: None,
            node_info: None,
            inbox_pipeline: OnceLock::new(),
        }
    }

    /// Register the actor endpoint at `path` (e.g. `"/users/{handle}"`).
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Routing`] if `path`'s shape collides with
    /// an already-registered route.
    pub fn set_actor_dispatcher(
        &mut self,
        path: impl Into<String>,
        dispatcher: impl ActorDispatcher<C> + 'static,
    ) -> Result<&mut ActorRegistration<C>, FederationError> {
        let path = path.into();
        self.router.register("actor", &path)?;
        self.actor = Some(ActorRegistration::new(path, Arc::new(dispatcher)));
        Ok(self.actor.as_mut().expect("just assigned"))
    }

    /// Register a collection endpoint at `path` for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Routing`] if `path`'s shape collides with
    /// an already-registered route.
    pub fn set_collection_dispatcher(
        &mut self,
        kind: CollectionKind,
        path: impl Into<String>,
        source: impl CollectionSource<C> + 'static,
    ) -> Result<&mut Self, FederationError> {
        let path = path.into();
        self.router.register(kind.route_name(), &path)?;
        self.collections.insert(kind, CollectionRegistration { path, source: Arc::new(source) });
        Ok(self)
    }

    /// Register an object endpoint at `path` for the compact type name
    /// `class` (e.g. `"Note"`).
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Routing`] if `path`'s shape collides with
    /// an already-registered route.
    pub fn set_object_dispatcher(
        &mut self,
        class: impl Into<String>,
        path: impl Into<String>,
        dispatcher: impl ObjectDispatcher<C> + 'static,
    ) -> Result<&mut Self, FederationError> {
        let class = class.into();
        let path = path.into();
        let registration = ObjectRegistration { class, path: path.clone(), dispatcher: Arc::new(dispatcher) };
        self.router.register(registration.route_name(), &path)?;
        self.objects.push(registration);
        Ok(self)
    }

    /// Register the inbox endpoint at `path` (e.g.
    /// `"/users/{handle}/inbox"`), and the shared inbox at `shared_path` if
    /// given (e.g. `"/inbox"`).
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Routing`] if either path's shape collides
    /// with an already-registered route.
    pub fn set_inbox_listeners(
        &mut self,
        path: impl Into<String>,
        shared_path: Option<String>,
    ) -> Result<&mut InboxRegistration<C>, FederationError> {
        let path = path.into();
        self.router.register("inbox", &path)?;
        if let Some(shared) = &shared_path {
            self.router.register("inbox:shared", shared)?;
        }
        self.inbox = Some(InboxRegistration::new(path, shared_path));
        Ok(self.inbox.as_mut().expect("just assigned"))
    }

    /// Register `/nodeinfo/2.1` at `path`, served by `dispatcher`, and turn
    /// on `.well-known/nodeinfo` discovery pointing at it.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Routing`] if `path`'s shape collides with
    /// an already-registered route.
    pub fn set_node_info_dispatcher(
        &mut self,
        path: impl Into<String>,
        dispatcher: impl NodeInfoDispatcher<C> + 'static,
    ) -> Result<&mut Self, FederationError> {
        let path = path.into();
        self.router.register("node_info", &path)?;
        self.node_info_path = Some(path);
        self.node_info = Some(Arc::new(dispatcher));
        Ok(self)
    }

    /// Build the [`FederationContext`] threaded through every dispatcher
    /// call during [`Federation::fetch`].
    #[must_use]
    pub fn create_context(&self, data: Arc<C>) -> FederationContext<C> {
        FederationContext {
            base_url: self.base_url.clone(),
            data,
            documents: self.documents.clone(),
            queue: self.queue.clone(),
            router: Arc::new(self.router.clone()),
        }
    }

    /// Start delivering queued outbound activities: subscribes an
    /// [`OutboxWorker`] to this federation's queue, resolving sender keys
    /// from the registered actor's key pairs dispatcher.
    ///
    /// A no-op (with a warning logged) if no actor, or no key pairs
    /// dispatcher on the actor, is registered — there is nothing to sign
    /// deliveries with.
    pub fn start_queue(&self, context_data: Arc<C>) {
        let Some(actor) = &self.actor else {
            warn!("start_queue called with no actor registered; outbound delivery is disabled");
            return;
        };
        let Some(key_pairs) = actor.key_pairs.clone() else {
            warn!("start_queue called with no key pairs dispatcher registered; outbound delivery is disabled");
            return;
        };
        let context = self.create_context(context_data);
        let provider: Arc<dyn SenderKeyProvider> = Arc::new(KeyPairsSenderProvider { key_pairs, context });
        let worker = Arc::new(OutboxWorker::new(self.queue.clone(), provider, self.delivery_config.clone()));
        self.queue.subscribe(worker);
    }

    /// Answer one HTTP request: WebFinger, NodeInfo, the actor document, a
    /// collection, the inbox, or a registered object endpoint, whichever
    /// the request's method and path resolve to.
    pub async fn fetch(&self, request: Request<Vec<u8>>, options: FetchOptions<C>) -> Response<Vec<u8>> {
        let (parts, body) = request.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_string();
        let query = query_params(&parts.uri);
        let context = self.create_context(options.context_data.clone());

        if path == WELL_KNOWN_WEBFINGER {
            return self.serve_webfinger(&method, &query, &context, &parts, &body, &options).await;
        }
        if path == WELL_KNOWN_NODEINFO {
            return self.serve_nodeinfo_discovery(&method);
        }

        let Some(matched) = self.router.match_path(&path) else {
            return self.run_fallback(&options.on_not_found, &parts, &body, StatusCode::NOT_FOUND).await;
        };

        if matched.name == "actor" {
            if method != Method::GET {
                return empty_status(StatusCode::METHOD_NOT_ALLOWED);
            }
            return self.serve_actor(&matched.vars, &context, &parts, &body, &options).await;
        }
        if matched.name == "inbox" || matched.name == "inbox:shared" {
            if method != Method::POST {
                return empty_status(StatusCode::METHOD_NOT_ALLOWED);
            }
            return self.serve_inbox(&matched.name, &matched.vars, &parts, &body, &context).await;
        }
        if matched.name == "node_info" {
            if method != Method::GET {
                return empty_status(StatusCode::METHOD_NOT_ALLOWED);
            }
            return self.serve_nodeinfo_document(&context).await;
        }
        if let Some(kind) = CollectionKind::from_route_name(&matched.name) {
            if method != Method::GET {
                return empty_status(StatusCode::METHOD_NOT_ALLOWED);
            }
            return self.serve_collection(kind, &matched.vars, &context, &query, &parts, &body, &options).await;
        }
        if let Some(class) = matched.name.strip_prefix("object:") {
            if method != Method::GET {
                return empty_status(StatusCode::METHOD_NOT_ALLOWED);
            }
            return self.serve_object(class, &matched.vars, &context, &parts, &body, &options).await;
        }

        self.run_fallback(&options.on_not_found, &parts, &body, StatusCode::NOT_FOUND).await
    }

    async fn serve_actor(
        &self,
        vars: &BTreeMap<String, String>,
        context: &FederationContext<C>,
        parts: &axum::http::request::Parts,
        body: &[u8],
        options: &FetchOptions<C>,
    ) -> Response<Vec<u8>> {
        let Some(actor) = &self.actor else {
            return self.run_fallback(&options.on_not_found, parts, body, StatusCode::NOT_FOUND).await;
        };
        if let Some(authorizer) = &actor.authorizer {
            if !authorizer(vars) {
                return self.run_fallback(&options.on_unauthorized, parts, body, StatusCode::UNAUTHORIZED).await;
            }
        }
        match actor.dispatcher.dispatch(context, vars).await {
            Ok(Some(entity)) => {
                if prefers_html(&parts.headers) {
                    return self.run_fallback(&options.on_not_acceptable, parts, body, StatusCode::NOT_ACCEPTABLE).await;
                }
                json_response(StatusCode::OK, AS2_CONTENT_TYPE, &encode_entity(&entity))
            }
            Ok(None) => self.run_fallback(&options.on_not_found, parts, body, StatusCode::NOT_FOUND).await,
            Err(err) => {
                warn!(error = %err, "actor dispatcher failed");
                empty_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    async fn serve_object(
        &self,
        class: &str,
        vars: &BTreeMap<String, String>,
        context: &FederationContext<C>,
        parts: &axum::http::request::Parts,
        body: &[u8],
        options: &FetchOptions<C>,
    ) -> Response<Vec<u8>> {
        let Some(registration) = self.objects.iter().find(|o| o.class == class) else {
            return self.run_fallback(&options.on_not_found, parts, body, StatusCode::NOT_FOUND).await;
        };
        match registration.dispatcher.dispatch(context, vars).await {
            Ok(Some(entity)) => {
                if prefers_html(&parts.headers) {
                    return self.run_fallback(&options.on_not_acceptable, parts, body, StatusCode::NOT_ACCEPTABLE).await;
                }
                json_response(StatusCode::OK, AS2_CONTENT_TYPE, &encode_entity(&entity))
            }
            Ok(None) => self.run_fallback(&options.on_not_found, parts, body, StatusCode::NOT_FOUND).await,
            Err(err) => {
                warn!(error = %err, "object dispatcher failed");
                empty_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn serve_collection(
        &self,
        kind: CollectionKind,
        vars: &BTreeMap<String, String>,
        context: &FederationContext<C>,
        query: &BTreeMap<String, String>,
        parts: &axum::http::request::Parts,
        body: &[u8],
        options: &FetchOptions<C>,
    ) -> Response<Vec<u8>> {
        let Some(registration) = self.collections.get(&kind) else {
            return self.run_fallback(&options.on_not_found, parts, body, StatusCode::NOT_FOUND).await;
        };

        let dispatcher = match registration.source.dispatcher(context, vars).await {
            Ok(Some(dispatcher)) => dispatcher,
            Ok(None) => return self.run_fallback(&options.on_not_found, parts, body, StatusCode::NOT_FOUND).await,
            Err(err) => {
                warn!(error = %err, "collection dispatcher lookup failed");
                return empty_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let collection_id = match context.url_for(kind.route_name(), vars) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "failed to build this collection's own id");
                return empty_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let mut endpoint = CollectionEndpoint::new(collection_id, dispatcher);
        match registration.source.counter(context, vars).await {
            Ok(Some(counter)) => endpoint = endpoint.with_counter(counter),
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "collection counter lookup failed");
                return empty_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
        match registration.source.first_cursor(context, vars).await {
            Ok(Some(first_cursor)) => endpoint = endpoint.with_first_cursor(first_cursor),
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "collection first-cursor lookup failed");
                return empty_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
        if let Some(authorizer) = registration.source.authorizer() {
            endpoint = endpoint.with_authorizer(authorizer);
        }

        let cursor = query.get("cursor").map(String::as_str);
        let authorization = parts.headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string);
        let request = CollectionRequest { authorization, signed_by: None };

        match endpoint.respond(cursor, &request).await {
            Ok(value) => json_response(StatusCode::OK, AS2_CONTENT_TYPE, &value),
            Err(fedi_collection::CollectionError::Unauthorized) => {
                self.run_fallback(&options.on_unauthorized, parts, body, StatusCode::UNAUTHORIZED).await
            }
            Err(err) => {
                warn!(error = %err, "collection response failed");
                empty_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    async fn serve_inbox(
        &self,
        route_name: &str,
        vars: &BTreeMap<String, String>,
        parts: &axum::http::request::Parts,
        body: &[u8],
        context: &FederationContext<C>,
    ) -> Response<Vec<u8>> {
        let Some(registration) = &self.inbox else {
            return empty_status(StatusCode::NOT_FOUND);
        };
        let pipeline = self.inbox_pipeline.get_or_init(|| {
            Arc::new(InboxPipeline::new(
                self.documents.clone(),
                self.dedup_store.clone(),
                &self.inbox_config,
                registration.listeners.clone(),
            ))
        });
        let recipient = if route_name == "inbox" { vars.values().next().map(String::as_str) } else { None };
        let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str().to_string()).unwrap_or_else(|| parts.uri.path().to_string());
        let outcome = pipeline.receive(body, "post", &path_and_query, &parts.headers, recipient, Arc::new(context.clone())).await;
        empty_status(inbox_status(&outcome))
    }

    async fn serve_webfinger(
        &self,
        method: &Method,
        query: &BTreeMap<String, String>,
        context: &FederationContext<C>,
        parts: &axum::http::request::Parts,
        body: &[u8],
        options: &FetchOptions<C>,
    ) -> Response<Vec<u8>> {
        if *method != Method::GET {
            return empty_status(StatusCode::METHOD_NOT_ALLOWED);
        }
        let Some(resource) = query.get("resource") else {
            return empty_status(StatusCode::BAD_REQUEST);
        };
        let Some(actor) = &self.actor else {
            return self.run_fallback(&options.on_not_found, parts, body, StatusCode::NOT_FOUND).await;
        };
        let host = reqwest::Url::parse(&self.base_url).ok().and_then(|u| u.host_str().map(str::to_string)).unwrap_or_default();
        let adapter: Arc<dyn fedi_webfinger::ActorDispatcher> =
            Arc::new(WebFingerAdapter { dispatcher: actor.dispatcher.clone(), context: context.clone() });
        let mut server = WebFingerServer::new(host, Arc::new(self.router.clone()), "actor", adapter);
        if let Some(mapper) = &actor.acct_vars {
            server = server.with_acct_vars(mapper.clone());
        }
        match server.handle(resource).await {
            Ok(Some(jrd)) => json_response(StatusCode::OK, JRD_CONTENT_TYPE, &serde_json::to_value(&jrd).unwrap_or(Value::Null)),
            Ok(None) => self.run_fallback(&options.on_not_found, parts, body, StatusCode::NOT_FOUND).await,
            Err(_) => empty_status(StatusCode::BAD_REQUEST),
        }
    }

    fn serve_nodeinfo_discovery(&self, method: &Method) -> Response<Vec<u8>> {
        if *method != Method::GET {
            return empty_status(StatusCode::METHOD_NOT_ALLOWED);
        }
        let Some(node_info_path) = &self.node_info_path else {
            return empty_status(StatusCode::NOT_FOUND);
        };
        let discovery = NodeInfoDiscovery {
            links: vec![NodeInfoLink { rel: NODE_INFO_SCHEMA_2_1.to_string(), href: format!("{}{}", self.base_url, node_info_path) }],
        };
        json_response(StatusCode::OK, "application/json", &serde_json::to_value(&discovery).unwrap_or(Value::Null))
    }

    async fn serve_nodeinfo_document(&self, context: &FederationContext<C>) -> Response<Vec<u8>> {
        let Some(dispatcher) = &self.node_info else {
            return empty_status(StatusCode::NOT_FOUND);
        };
        match dispatcher.dispatch(context).await {
            Ok(info) => json_response(StatusCode::OK, NODE_INFO_CONTENT_TYPE, &serde_json::to_value(&info).unwrap_or(Value::Null)),
            Err(err) => {
                warn!(error = %err, "node info dispatcher failed");
                empty_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    async fn run_fallback(
        &self,
        handler: &Option<FallbackHandler>,
        parts: &axum::http::request::Parts,
        body: &[u8],
        default_status: StatusCode,
    ) -> Response<Vec<u8>> {
        match handler {
            Some(handler) => handler(rebuild_request(parts, body)).await,
            None => empty_status(default_status),
        }
    }
}

/// Bridges [`ActorKeyPairsDispatcher`] (keyed by the router-captured
/// handle) to [`SenderKeyProvider`] (keyed by the full actor IRI), so
/// [`Federation::start_queue`] can hand the outbox worker a key provider
/// without asking embedders to implement both traits.
struct KeyPairsSenderProvider<C> {
    key_pairs: Arc<dyn ActorKeyPairsDispatcher<C>>,
    context: FederationContext<C>,
}

#[async_trait]
impl<C: Send + Sync> SenderKeyProvider for KeyPairsSenderProvider<C> {
    async fn resolve(&self, actor_id: &str) -> Result<Option<SenderKey>, OutboxError> {
        let Some(path) = reqwest::Url::parse(actor_id).ok().map(|u| u.path().to_string()) else {
            return Ok(None);
        };
        let Some(matched) = self.context.router.match_path(&path) else {
            return Ok(None);
        };
        if matched.name != "actor" {
            return Ok(None);
        }
        let Some(handle) = matched.vars.values().next() else {
            return Ok(None);
        };
        let pairs = self
            .key_pairs
            .dispatch(&self.context, handle)
            .await
            .map_err(|err| OutboxError::KeyProviderFailed { reason: err.to_string() })?;
        let rsa_pair = pairs.into_iter().find(|p| p.algorithm == fedi_crypto::KeyAlgorithm::Rsa);
        Ok(rsa_pair.map(|p| SenderKey { key_id: p.key_id, pair: p.pair }))
    }
}

/// Bridges this crate's context-aware [`ActorDispatcher`] to
/// `fedi_webfinger::ActorDispatcher`'s context-free signature, so a
/// `WebFingerServer` can be built directly from a registered actor
/// dispatcher.
struct WebFingerAdapter<C> {
    dispatcher: Arc<dyn ActorDispatcher<C>>,
    context: FederationContext<C>,
}

#[async_trait]
impl<C: Send + Sync> fedi_webfinger::ActorDispatcher for WebFingerAdapter<C> {
    async fn dispatch(&self, vars: &BTreeMap<String, String>) -> Result<Option<Entity>, fedi_webfinger::WebFingerError> {
        self.dispatcher
            .dispatch(&self.context, vars)
            .await
            .map_err(|err| fedi_webfinger::WebFingerError::DispatcherFailed { reason: err.to_string() })
    }
}

fn query_params(uri: &axum::http::Uri) -> BTreeMap<String, String> {
    let Some(query) = uri.query() else { return BTreeMap::new() };
    let dummy = format!("https://fedi.invalid/?{query}");
    match reqwest::Url::parse(&dummy) {
        Ok(parsed) => parsed.query_pairs().into_owned().collect(),
        Err(_) => BTreeMap::new(),
    }
}

fn prefers_html(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(axum::http::header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    for entry in accept.split(',') {
        let media_type = entry.split(';').next().unwrap_or("").trim();
        match media_type {
            "text/html" | "application/xhtml+xml" => return true,
            AS2_CONTENT_TYPE | "application/ld+json" | "application/json" | "*/*" => return false,
            _ => {}
        }
    }
    false
}

fn encode_entity(entity: &Entity) -> Value {
    let mut document = entity.to_value();
    if let Value::Object(map) = &mut document {
        map.insert("@context".into(), context_for(entity));
    }
    document
}

fn context_for(entity: &Entity) -> Value {
    let uses_security =
        SECURITY_TERMS.iter().any(|term| entity.get_functional(term).is_some() || !entity.get_plural(term).is_empty());
    if uses_security {
        serde_json::json!([ACTIVITYSTREAMS_CONTEXT, SECURITY_CONTEXT])
    } else {
        serde_json::json!(ACTIVITYSTREAMS_CONTEXT)
    }
}

fn inbox_status(outcome: &InboxOutcome) -> StatusCode {
    match outcome {
        InboxOutcome::Malformed => StatusCode::BAD_REQUEST,
        InboxOutcome::Unverified => StatusCode::UNAUTHORIZED,
        InboxOutcome::Retry => StatusCode::SERVICE_UNAVAILABLE,
        InboxOutcome::Duplicate | InboxOutcome::NoListener | InboxOutcome::Accepted => StatusCode::ACCEPTED,
    }
}

fn json_response(status: StatusCode, content_type: &str, value: &Value) -> Response<Vec<u8>> {
    let body = serde_json::to_vec(value).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(axum::http::header::CONTENT_TYPE, content_type)
        .body(body)
        .expect("serialized JSON body with a static content type cannot fail to build")
}

fn empty_status(status: StatusCode) -> Response<Vec<u8>> {
    Response::builder().status(status).body(Vec::new()).expect("a bare status response cannot fail to build")
}

fn rebuild_request(parts: &axum::http::request::Parts, body: &[u8]) -> Request<Vec<u8>> {
    let mut builder = Request::builder().method(parts.method.clone()).uri(parts.uri.clone()).version(parts.version);
    for (name, value) in &parts.headers {
        builder = builder.header(name, value);
    }
    builder.body(body.to_vec()).expect("rebuilding a request from its own parts cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedi_collection::{CollectionCounter, CollectionDispatcher, CollectionError, CollectionPage};
    use fedi_loader::{InMemoryKvStore, LoaderError, RemoteDocument};
    use fedi_queue::MemoryQueue;
    use serde_json::json;

    struct NoopLoader;

    #[async_trait]
    impl DocumentLoader for NoopLoader {
        async fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
            Err(LoaderError::HttpStatus { url: url.to_string(), status: 404 })
        }
    }

    struct FixedActor(Option<Entity>);

    #[async_trait]
    impl ActorDispatcher<()> for FixedActor {
        async fn dispatch(&self, _context: &FederationContext<()>, _vars: &BTreeMap<String, String>) -> Result<Option<Entity>, FederationError> {
            Ok(self.0.clone())
        }
    }

    fn alice() -> Entity {
        Entity::from_value(json!({"id": "https://example.com/users/alice", "type": "Person", "preferredUsername": "alice"})).unwrap()
    }

    fn federation_with_actor(actor: Option<Entity>) -> Federation<()> {
        let mut federation = Federation::new(
            "https://example.com",
            Arc::new(NoopLoader) as Arc<dyn DocumentLoader>,
            Arc::new(MemoryQueue::new()) as Arc<dyn MessageQueue>,
            Arc::new(InMemoryKvStore::new()) as Arc<dyn KvStore>,
            InboxConfig::default(),
            DeliveryConfig::default(),
        );
        federation.set_actor_dispatcher("/users/{handle}", FixedActor(actor)).unwrap();
        federation
    }

    fn get(path: &str) -> Request<Vec<u8>> {
        Request::builder().method(Method::GET).uri(path).body(Vec::new()).unwrap()
    }

    #[tokio::test]
    async fn actor_get_serves_activity_json() {
        let federation = federation_with_actor(Some(alice()));
        let response = federation.fetch(get("/users/alice"), FetchOptions::new(Arc::new(()))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(axum::http::header::CONTENT_TYPE).unwrap(), AS2_CONTENT_TYPE);
        let value: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(value["preferredUsername"], "alice");
        assert_eq!(value["@context"], ACTIVITYSTREAMS_CONTEXT);
    }

    #[tokio::test]
    async fn actor_get_missing_is_not_found() {
        let federation = federation_with_actor(None);
        let response = federation.fetch(get("/users/ghost"), FetchOptions::new(Arc::new(()))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn actor_get_delegates_to_not_acceptable_fallback_for_html() {
        let federation = federation_with_actor(Some(alice()));
        let request = Request::builder().method(Method::GET).uri("/users/alice").header(axum::http::header::ACCEPT, "text/html").body(Vec::new()).unwrap();
        let options = FetchOptions::new(Arc::new(())).on_not_acceptable(Arc::new(|_req| {
            Box::pin(async { Response::builder().status(StatusCode::OK).body(b"<html></html>".to_vec()).unwrap() })
        }));
        let response = federation.fetch(request, options).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), b"<html></html>");
    }

    #[tokio::test]
    async fn unmatched_route_is_not_found() {
        let federation = federation_with_actor(Some(alice()));
        let response = federation.fetch(get("/nowhere"), FetchOptions::new(Arc::new(()))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn webfinger_resolves_local_actor_via_https_resource() {
        let federation = federation_with_actor(Some(alice()));
        let response =
            federation.fetch(get("/.well-known/webfinger?resource=https://example.com/users/alice"), FetchOptions::new(Arc::new(()))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(value["subject"], "https://example.com/users/alice");
    }

    #[tokio::test]
    async fn webfinger_acct_resource_without_a_handle_mapper_is_bad_request() {
        let federation = federation_with_actor(Some(alice()));
        let response =
            federation.fetch(get("/.well-known/webfinger?resource=acct:alice@example.com"), FetchOptions::new(Arc::new(()))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    struct FixedCollectionSource;

    #[async_trait]
    impl CollectionSource<()> for FixedCollectionSource {
        async fn dispatcher(
            &self,
            _context: &FederationContext<()>,
            _vars: &BTreeMap<String, String>,
        ) -> Result<Option<Arc<dyn CollectionDispatcher>>, FederationError> {
            Ok(Some(Arc::new(FixedCollectionDispatcher)))
        }

        async fn counter(
            &self,
            _context: &FederationContext<()>,
            _vars: &BTreeMap<String, String>,
        ) -> Result<Option<Arc<dyn CollectionCounter>>, FederationError> {
            Ok(Some(Arc::new(FixedCollectionCounter)))
        }
    }

    struct FixedCollectionDispatcher;

    #[async_trait]
    impl CollectionDispatcher for FixedCollectionDispatcher {
        async fn page(&self, _cursor: Option<&str>) -> Result<CollectionPage, CollectionError> {
            Ok(CollectionPage::default())
        }
    }

    struct FixedCollectionCounter;

    #[async_trait]
    impl CollectionCounter for FixedCollectionCounter {
        async fn count(&self) -> Result<u64, CollectionError> {
            Ok(7)
        }
    }

    #[tokio::test]
    async fn collection_summary_reports_total_items() {
        let mut federation = federation_with_actor(Some(alice()));
        federation.set_collection_dispatcher(CollectionKind::Outbox, "/users/{handle}/outbox", FixedCollectionSource).unwrap();
        let response = federation.fetch(get("/users/alice/outbox"), FetchOptions::new(Arc::new(()))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(value["totalItems"], 7.0);
    }

    #[tokio::test]
    async fn nodeinfo_discovery_points_at_registered_document() {
        struct FixedNodeInfo;

        #[async_trait]
        impl NodeInfoDispatcher<()> for FixedNodeInfo {
            async fn dispatch(&self, _context: &FederationContext<()>) -> Result<NodeInfo, FederationError> {
                Ok(NodeInfo::new("fedi-federation", "0.1.0"))
            }
        }

        let mut federation = federation_with_actor(None);
        federation.set_node_info_dispatcher("/nodeinfo/2.1", FixedNodeInfo).unwrap();

        let discovery = federation.fetch(get("/.well-known/nodeinfo"), FetchOptions::new(Arc::new(()))).await;
        assert_eq!(discovery.status(), StatusCode::OK);
        let value: Value = serde_json::from_slice(discovery.body()).unwrap();
        assert_eq!(value["links"][0]["href"], "https://example.com/nodeinfo/2.1");

        let document = federation.fetch(get("/nodeinfo/2.1"), FetchOptions::new(Arc::new(()))).await;
        assert_eq!(document.status(), StatusCode::OK);
        let value: Value = serde_json::from_slice(document.body()).unwrap();
        assert_eq!(value["software"]["name"], "fedi-federation");
    }

    #[tokio::test]
    async fn inbox_post_with_malformed_body_is_bad_request() {
        let mut federation = federation_with_actor(Some(alice()));
        federation.set_inbox_listeners("/users/{handle}/inbox", Some("/inbox".to_string())).unwrap();
        let request = Request::builder().method(Method::POST).uri("/users/alice/inbox").body(b"not json".to_vec()).unwrap();
        let response = federation.fetch(request, FetchOptions::new(Arc::new(()))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn inbox_post_unverified_activity_is_unauthorized() {
        let mut federation = federation_with_actor(Some(alice()));
        federation.set_inbox_listeners("/users/{handle}/inbox", None).unwrap();
        let body = serde_json::to_vec(&json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "id": "https://a.example/activities/1",
            "type": "Follow",
            "actor": "https://a.example/users/a",
            "object": "https://example.com/users/alice"
        }))
        .unwrap();
        let request = Request::builder().method(Method::POST).uri("/users/alice/inbox").body(body).unwrap();
        let response = federation.fetch(request, FetchOptions::new(Arc::new(()))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn prefers_html_recognizes_browser_accept_header() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8".parse().unwrap());
        assert!(prefers_html(&headers));
    }

    #[test]
    fn prefers_html_is_false_for_activity_json_accept_header() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::ACCEPT, AS2_CONTENT_TYPE.parse().unwrap());
        assert!(!prefers_html(&headers));
    }

    #[test]
    fn prefers_html_is_false_with_no_accept_header() {
        assert!(!prefers_html(&HeaderMap::new()));
    }
}

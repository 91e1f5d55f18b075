//! `handle_webfinger`: the WebFinger server side.

use crate::error::WebFingerError;
use crate::jrd::{Jrd, JrdLink, ACTIVITY_JSON, REL_AVATAR, REL_PROFILE_PAGE, REL_SELF};
use async_trait::async_trait;
use fedi_router::Router;
use fedi_vocab::Entity;
use reqwest::Url;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Resolves the matched actor route's variables to an actor entity, or
/// `None` if no actor exists at that address.
#[async_trait]
pub trait ActorDispatcher: Send + Sync {
    /// Look up the actor identified by `vars` (the router's captured path
    /// variables for the actor route).
    ///
    /// # Errors
    ///
    /// Returns [`WebFingerError::DispatcherFailed`] on a backing-store
    /// failure; an absent actor is `Ok(None)`, not an error.
    async fn dispatch(&self, vars: &BTreeMap<String, String>) -> Result<Option<Entity>, WebFingerError>;
}

/// Serves `.well-known/webfinger` for a single local domain.
pub struct WebFingerServer {
    host: String,
    router: Arc<Router>,
    actor_route: String,
    dispatcher: Arc<dyn ActorDispatcher>,
    acct_vars: Option<Arc<dyn Fn(&str) -> BTreeMap<String, String> + Send + Sync>>,
}

impl WebFingerServer {
    /// Serve WebFinger for `host`, resolving `https:` resource URLs that
    /// match `actor_route` in `router` to actors via `dispatcher`.
    #[must_use]
    pub fn new(host: impl Into<String>, router: Arc<Router>, actor_route: impl Into<String>, dispatcher: Arc<dyn ActorDispatcher>) -> Self {
        Self { host: host.into(), router, actor_route: actor_route.into(), dispatcher, acct_vars: None }
    }

    /// Accept `acct:user@{host}` resources too, turning the local part into
    /// dispatcher variables via `mapper` (e.g. `{"handle": user.to_string()}`
    /// for a `/users/{handle}` actor route, or through a caller-owned
    /// identifier translation).
    #[must_use]
    pub fn with_acct_vars(mut self, mapper: Arc<dyn Fn(&str) -> BTreeMap<String, String> + Send + Sync>) -> Self {
        self.acct_vars = Some(mapper);
        self
    }

    /// Resolve `resource` and build its [`Jrd`].
    ///
    /// Returns `Ok(None)` when `resource` is a recognized shape but no
    /// actor exists there (callers should delegate to their not-found
    /// handler).
    ///
    /// # Errors
    ///
    /// Returns [`WebFingerError::InvalidResource`] if `resource` is neither
    /// a local actor URL nor a well-formed `acct:` URI for this host, and
    /// propagates [`WebFingerError::DispatcherFailed`].
    pub async fn handle(&self, resource: &str) -> Result<Option<Jrd>, WebFingerError> {
        let vars = self.resolve_vars(resource)?;
        let Some(actor) = self.dispatcher.dispatch(&vars).await? else {
            return Ok(None);
        };
        Ok(Some(self.build_jrd(resource, &actor)))
    }

    fn resolve_vars(&self, resource: &str) -> Result<BTreeMap<String, String>, WebFingerError> {
        if let Ok(url) = Url::parse(resource) {
            return self
                .router
                .match_path(url.path())
                .filter(|m| m.name == self.actor_route)
                .map(|m| m.vars)
                .ok_or_else(|| WebFingerError::InvalidResource { resource: resource.to_string() });
        }

        let Some(rest) = resource.strip_prefix("acct:") else {
            return Err(WebFingerError::InvalidResource { resource: resource.to_string() });
        };
        let Some((user, host)) = rest.split_once('@') else {
            return Err(WebFingerError::InvalidResource { resource: resource.to_string() });
        };
        if host != self.host {
            return Err(WebFingerError::InvalidResource { resource: resource.to_string() });
        }
        match &self.acct_vars {
            Some(mapper) => Ok(mapper(user)),
            None => Err(WebFingerError::InvalidResource { resource: resource.to_string() }),
        }
    }

    fn build_jrd(&self, resource: &str, actor: &Entity) -> Jrd {
        let actor_url = actor.id().unwrap_or(resource).to_string();
        let mut aliases = Vec::new();

        if resource.starts_with("acct:") {
            aliases.push(actor_url.clone());
        } else if let Some(username) = actor.get_str("preferredUsername") {
            aliases.push(format!("acct:{username}@{}", self.host));
        }

        let mut links = vec![JrdLink { rel: REL_SELF.to_string(), media_type: Some(ACTIVITY_JSON.to_string()), href: Some(actor_url) }];

        for value in actor.get_plural("url") {
            if let Some(link) = link_from_url_value(value, REL_PROFILE_PAGE) {
                links.push(link);
            }
        }
        for value in actor.get_plural("icon") {
            if let Some(link) = link_from_url_value(value, REL_AVATAR) {
                links.push(link);
            }
        }

        Jrd { subject: resource.to_string(), aliases, links, properties: HashMap::new() }
    }
}

fn link_from_url_value(value: &Value, default_rel: &str) -> Option<JrdLink> {
    match value {
        Value::String(href) => Some(JrdLink { rel: default_rel.to_string(), media_type: None, href: Some(href.clone()) }),
        Value::Object(map) => {
            let href = map.get("href").or_else(|| map.get("url")).and_then(Value::as_str)?;
            let rel = map.get("rel").and_then(Value::as_str).unwrap_or(default_rel);
            let media_type = map.get("mediaType").and_then(Value::as_str).map(str::to_string);
            Some(JrdLink { rel: rel.to_string(), media_type, href: Some(href.to_string()) })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedDispatcher {
        actor: Option<Entity>,
    }

    #[async_trait]
    impl ActorDispatcher for FixedDispatcher {
        async fn dispatch(&self, _vars: &BTreeMap<String, String>) -> Result<Option<Entity>, WebFingerError> {
            Ok(self.actor.clone())
        }
    }

    fn alice() -> Entity {
        Entity::from_value(json!({
            "id": "https://example.com/users/alice",
            "type": "Person",
            "preferredUsername": "alice",
            "url": ["https://example.com/@alice"],
            "icon": [{"type": "Image", "url": "https://example.com/avatar.png", "mediaType": "image/png"}]
        }))
        .unwrap()
    }

    fn server_with(actor: Option<Entity>) -> WebFingerServer {
        let mut router = Router::new();
        router.register("actor", "/users/{handle}").unwrap();
        WebFingerServer::new("example.com", Arc::new(router), "actor", Arc::new(FixedDispatcher { actor }))
            .with_acct_vars(Arc::new(|user: &str| {
                let mut vars = BTreeMap::new();
                vars.insert("handle".to_string(), user.to_string());
                vars
            }))
    }

    #[tokio::test]
    async fn resolves_https_resource_via_router() {
        let server = server_with(Some(alice()));
        let jrd = server.handle("https://example.com/users/alice").await.unwrap().unwrap();
        assert_eq!(jrd.subject, "https://example.com/users/alice");
        assert!(jrd.aliases.contains(&"acct:alice@example.com".to_string()));
        assert!(jrd.links.iter().any(|l| l.rel == REL_SELF && l.href.as_deref() == Some("https://example.com/users/alice")));
        assert!(jrd.links.iter().any(|l| l.rel == REL_AVATAR));
    }

    #[tokio::test]
    async fn resolves_acct_resource_with_mapper() {
        let server = server_with(Some(alice()));
        let jrd = server.handle("acct:alice@example.com").await.unwrap().unwrap();
        assert_eq!(jrd.subject, "acct:alice@example.com");
        assert!(jrd.aliases.contains(&"https://example.com/users/alice".to_string()));
    }

    #[tokio::test]
    async fn missing_actor_returns_none() {
        let server = server_with(None);
        assert!(server.handle("acct:ghost@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_host_is_invalid_resource() {
        let server = server_with(Some(alice()));
        let err = server.handle("acct:alice@other.example").await.unwrap_err();
        assert!(matches!(err, WebFingerError::InvalidResource { .. }));
    }

    #[tokio::test]
    async fn unroutable_https_resource_is_invalid() {
        let server = server_with(Some(alice()));
        let err = server.handle("https://example.com/nowhere").await.unwrap_err();
        assert!(matches!(err, WebFingerError::InvalidResource { .. }));
    }
}

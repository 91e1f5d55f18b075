//! Serving NodeInfo 2.1 (`.well-known/nodeinfo` discovery plus the
//! `/nodeinfo/2.1` document itself).

use crate::context::FederationContext;
use crate::error::FederationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The schema URI the discovery document's `rel` links to, identifying the
/// 2.1 dialect this crate serves exclusively.
pub const NODE_INFO_SCHEMA_2_1: &str = "http://nodeinfo.diaspora.software/ns/schema/2.1";

/// `GET /.well-known/nodeinfo`'s body: links to every NodeInfo version a
/// server advertises. This crate only ever links the 2.1 schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeInfoDiscovery {
    /// The one-entry link list pointing at this server's `/nodeinfo/2.1`.
    pub links: Vec<NodeInfoLink>,
}

/// One entry of a [`NodeInfoDiscovery`] document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeInfoLink {
    /// Always [`NODE_INFO_SCHEMA_2_1`].
    pub rel: String,
    /// The absolute URL of the `/nodeinfo/2.1` document.
    pub href: String,
}

/// The software identification block of a [`NodeInfo`] document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeInfoSoftware {
    /// The software's canonical name, lowercase, no spaces.
    pub name: String,
    /// The running version string.
    pub version: String,
    /// Source repository URL, if published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Project homepage URL, if published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// User-count statistics reported in [`NodeInfoUsage`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeInfoUsers {
    /// Total registered local accounts.
    pub total: u64,
    /// Accounts active in the last month.
    #[serde(rename = "activeMonth", skip_serializing_if = "Option::is_none")]
    pub active_month: Option<u64>,
    /// Accounts active in the last six months.
    #[serde(rename = "activeHalfyear", skip_serializing_if = "Option::is_none")]
    pub active_half_year: Option<u64>,
}

/// Activity volume reported in a [`NodeInfo`] document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeInfoUsage {
    /// Local account counts.
    pub users: NodeInfoUsers,
    /// Total locally-originated posts, if tracked.
    #[serde(rename = "localPosts", skip_serializing_if = "Option::is_none")]
    pub local_posts: Option<u64>,
    /// Total locally-originated comments, if tracked.
    #[serde(rename = "localComments", skip_serializing_if = "Option::is_none")]
    pub local_comments: Option<u64>,
}

/// `GET /nodeinfo/2.1`'s body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeInfo {
    /// Always `"2.1"`.
    pub version: String,
    /// What this server runs.
    pub software: NodeInfoSoftware,
    /// Federation protocols spoken; this crate always includes
    /// `"activitypub"`.
    pub protocols: Vec<String>,
    /// Inbound/outbound third-party service integrations. Usually empty for
    /// a framework-level embedder.
    #[serde(default)]
    pub services: NodeInfoServices,
    /// Whether new local accounts can self-register.
    #[serde(rename = "openRegistrations")]
    pub open_registrations: bool,
    /// Usage statistics.
    pub usage: NodeInfoUsage,
    /// Free-form extension metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl NodeInfo {
    /// Start building a document for `software_name`/`software_version`,
    /// with no registrations open and zeroed usage — callers fill in the
    /// rest via struct-update syntax or direct field assignment.
    #[must_use]
    pub fn new(software_name: impl Into<String>, software_version: impl Into<String>) -> Self {
        Self {
            version: "2.1".to_string(),
            software: NodeInfoSoftware {
                name: software_name.into(),
                version: software_version.into(),
                repository: None,
                homepage: None,
            },
            protocols: vec!["activitypub".to_string()],
            services: NodeInfoServices::default(),
            open_registrations: false,
            usage: NodeInfoUsage::default(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Third-party inbound/outbound service integrations a [`NodeInfo`]
/// document can advertise.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeInfoServices {
    /// Services this server can receive content from.
    #[serde(default)]
    pub inbound: Vec<String>,
    /// Services this server can publish content to.
    #[serde(default)]
    pub outbound: Vec<String>,
}

/// Resolves this server's current [`NodeInfo`] document on every request —
/// implementations typically query account/post counts fresh rather than
/// caching, since NodeInfo is polled infrequently by directories and
/// monitoring tools.
#[async_trait]
pub trait NodeInfoDispatcher<C>: Send + Sync {
    /// Build the document to serve at `/nodeinfo/2.1`.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::DispatcherFailed`] if gathering the
    /// statistics fails.
    async fn dispatch(&self, context: &FederationContext<C>) -> Result<NodeInfo, FederationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_defaults() {
        let info = NodeInfo::new("fedi-federation", "0.1.0");
        assert_eq!(info.version, "2.1");
        assert_eq!(info.protocols, vec!["activitypub".to_string()]);
        assert!(!info.open_registrations);
        assert_eq!(info.usage.users.total, 0);
    }

    #[test]
    fn discovery_document_serializes_expected_shape() {
        let discovery = NodeInfoDiscovery {
            links: vec![NodeInfoLink { rel: NODE_INFO_SCHEMA_2_1.to_string(), href: "https://example.com/nodeinfo/2.1".to_string() }],
        };
        let value = serde_json::to_value(&discovery).unwrap();
        assert_eq!(value["links"][0]["rel"], NODE_INFO_SCHEMA_2_1);
    }

    #[test]
    fn node_info_serializes_camel_case_usage_fields() {
        let mut info = NodeInfo::new("fedi-federation", "0.1.0");
        info.usage.users.active_month = Some(12);
        info.usage.local_posts = Some(340);
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["usage"]["users"]["activeMonth"], 12);
        assert_eq!(value["usage"]["localPosts"], 340);
        assert_eq!(value["openRegistrations"], false);
    }
}

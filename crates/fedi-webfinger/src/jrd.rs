//! The JSON Resource Descriptor (JRD): WebFinger's response body shape
//! (RFC 7033 §4.4).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A JSON Resource Descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Jrd {
    /// The URI the descriptor describes, normalized back to the `resource`
    /// query value it was resolved from.
    pub subject: String,
    /// Alternate identifiers for the same subject (e.g. the `acct:` form
    /// when `subject` is an `https:` URL, or vice versa).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Typed links describing the subject (profile page, avatar, the
    /// ActivityPub actor document itself).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<JrdLink>,
    /// Free-form string-valued properties. Unused by this crate's own
    /// construction but preserved on decode for interop.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, Option<String>>,
}

/// One `links` entry of a [`Jrd`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JrdLink {
    /// The link relation type, e.g. `"self"` or
    /// `"http://webfinger.net/rel/profile-page"`.
    pub rel: String,
    /// The link target's media type, if known.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// The link target URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Link relation used for the ActivityPub actor document itself.
pub const REL_SELF: &str = "self";
/// Link relation used for a human-facing profile page.
pub const REL_PROFILE_PAGE: &str = "http://webfinger.net/rel/profile-page";
/// Link relation used for an avatar image.
pub const REL_AVATAR: &str = "http://webfinger.net/rel/avatar";
/// Media type of the ActivityPub actor document.
pub const ACTIVITY_JSON: &str = "application/activity+json";
/// Media type this crate requests and serves WebFinger responses as.
pub const JRD_JSON: &str = "application/jrd+json";

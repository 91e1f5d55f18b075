//! `extract_inboxes`: group recipients into the distinct inbox URLs a single
//! activity delivery needs to reach, folding personal inboxes behind a
//! shared one where the recipient advertises it and the caller prefers it.

use fedi_vocab::Entity;
use reqwest::Url;
use std::collections::BTreeMap;

/// One inbox a delivery job targets, with every recipient whose inbox set
/// resolved to it (a shared inbox commonly serves several local recipients
/// at once).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxTarget {
    /// The inbox URL to POST the activity to.
    pub inbox: String,
    /// `true` if `inbox` is a shared inbox reached by more than one
    /// recipient's `endpoints.sharedInbox`, rather than a personal inbox.
    pub shared: bool,
    /// The `id` of every recipient this target serves.
    pub recipient_ids: Vec<String>,
}

/// Group `recipients` into delivery targets.
///
/// Recipients lacking both an `id` and a personal `inbox` are dropped
/// silently (the spec treats an un-inboxed recipient as undeliverable, not
/// an error). When `prefer_shared_inbox` is set and a recipient advertises
/// `endpoints.sharedInbox`, recipients sharing the same shared inbox are
/// folded into one [`InboxTarget`]. Any inbox whose origin (scheme + host +
/// port) matches one of `exclude_base_uris` is dropped entirely — this is
/// how a sender avoids delivering an activity back to its own server.
#[must_use]
pub fn extract_inboxes(recipients: &[Entity], prefer_shared_inbox: bool, exclude_base_uris: &[String]) -> Vec<InboxTarget> {
    let excluded_origins: Vec<String> = exclude_base_uris.iter().filter_map(|uri| origin_of(uri)).collect();

    let mut order: Vec<String> = Vec::new();
    let mut by_inbox: BTreeMap<String, (bool, Vec<String>)> = BTreeMap::new();

    for recipient in recipients {
        let Some(personal_inbox) = recipient.get_str("inbox") else {
            continue;
        };
        let shared_inbox = recipient
            .get_functional("endpoints")
            .and_then(|v| v.get("sharedInbox"))
            .and_then(serde_json::Value::as_str);

        let (target, shared) = match (prefer_shared_inbox, shared_inbox) {
            (true, Some(shared)) => (shared, true),
            _ => (personal_inbox, false),
        };

        if origin_of(target).is_some_and(|origin| excluded_origins.contains(&origin)) {
            continue;
        }

        let recipient_id = recipient.id().unwrap_or(personal_inbox).to_string();
        match by_inbox.get_mut(target) {
            Some((_, ids)) => ids.push(recipient_id),
            None => {
                order.push(target.to_string());
                by_inbox.insert(target.to_string(), (shared, vec![recipient_id]));
            }
        }
    }

    order
        .into_iter()
        .map(|inbox| {
            let (shared, recipient_ids) = by_inbox.remove(&inbox).expect("inbox was just inserted");
            InboxTarget { inbox, shared, recipient_ids }
        })
        .collect()
}

fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    Some(format!("{}://{}", parsed.scheme(), parsed.host_str()?.to_string() + &parsed.port().map(|p| format!(":{p}")).unwrap_or_default()))
}

//! `send_activity`: resolve recipients to actors, fold them into inbox
//! targets, and enqueue one [`DeliveryJob`] per inbox.

use crate::error::OutboxError;
use crate::inbox_set::extract_inboxes;
use crate::job::DeliveryJob;
use fedi_loader::DocumentLoader;
use fedi_queue::MessageQueue;
use fedi_vocab::Entity;
use serde_json::Value;
use std::sync::Arc;

/// Tuning knobs for [`send_activity`].
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Fold personal inboxes behind a recipient's `endpoints.sharedInbox`
    /// when it advertises one.
    pub prefer_shared_inbox: bool,
    /// Origins (`scheme://host[:port]`) to drop from the computed inbox
    /// set, so a sender never delivers an activity back to its own server.
    pub exclude_base_uris: Vec<String>,
}

/// Resolve `recipients` — each either a bare actor IRI or an already
/// embedded actor object — to actors, compute the resulting inbox set, and
/// enqueue one [`DeliveryJob`] per inbox onto `queue`.
///
/// Returns the number of inboxes a job was enqueued for. Recipients that
/// fail to resolve (fetch failure, malformed document) or resolve to an
/// actor without an `inbox` are dropped silently, matching
/// [`crate::inbox_set::extract_inboxes`]'s own treatment of un-inboxed
/// recipients.
///
/// # Errors
///
/// Propagates [`OutboxError::Queue`] if enqueuing a computed job fails.
pub async fn send_activity(
    sender_actor_id: &str,
    recipients: &[Value],
    activity: &Value,
    options: &SendOptions,
    loader: &dyn DocumentLoader,
    queue: &Arc<dyn MessageQueue>,
) -> Result<usize, OutboxError> {
    let mut resolved = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        if let Some(entity) = resolve_recipient(recipient, loader).await {
            resolved.push(entity);
        }
    }

    let targets = extract_inboxes(&resolved, options.prefer_shared_inbox, &options.exclude_base_uris);

    let activity_id = activity.get("id").and_then(Value::as_str).map(str::to_string);
    let activity_type = activity.get("type").and_then(Value::as_str).unwrap_or_default().to_string();

    for target in &targets {
        let job = DeliveryJob {
            inbox: target.inbox.clone(),
            shared: target.shared,
            activity_json: activity.clone(),
            sender_actor_id: sender_actor_id.to_string(),
            recipient_ids: target.recipient_ids.clone(),
            activity_id: activity_id.clone(),
            activity_type: activity_type.clone(),
            attempt: 0,
        };
        let payload = serde_json::to_value(&job).map_err(|e| OutboxError::MalformedJob { reason: e.to_string() })?;
        queue.enqueue(payload, None).await?;
    }

    Ok(targets.len())
}

async fn resolve_recipient(value: &Value, loader: &dyn DocumentLoader) -> Option<Entity> {
    match value {
        Value::Object(_) => Entity::from_value(value.clone()).ok(),
        Value::String(url) => {
            let remote = loader.load(url).await.ok()?;
            let normalized = fedi_jsonld::expand_for_decode(remote.document.clone()).unwrap_or(remote.document);
            Entity::from_value(normalized).ok()
        }
        _ => None,
    }
}

//! [`InboxPipeline`]: ties verification, deduplication, and listener
//! dispatch together into the single entry point a `POST /inbox` handler
//! calls.

use crate::dedup::InboxDeduplicator;
use crate::error::InboxError;
use crate::listener::{ListenerOutcome, ListenerRegistry};
use crate::verify::verify_activity;
use fedi_config::InboxConfig;
use fedi_httpsig::VerifyOptions;
use fedi_loader::{DocumentLoader, KvStore};
use fedi_telemetry::InboxMetrics;
use fedi_vocab::codec::TypedEntity;
use fedi_vocab::types::Activity;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tracing::info;

/// The result of running one inbound POST through [`InboxPipeline::receive`].
///
/// This maps directly to the HTTP status the caller's inbox handler
/// returns: [`InboxOutcome::Malformed`] to 400, [`InboxOutcome::Unverified`]
/// to 401, [`InboxOutcome::Retry`] to a 5xx, and everything else (accepted,
/// duplicate, no listener registered, or the listener ran to completion) to
/// 202.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxOutcome {
    /// The body wasn't valid JSON, or didn't decode to an `Activity`.
    Malformed,
    /// No verification mechanism accepted the request.
    Unverified,
    /// Already processed within the dedup window; not re-dispatched.
    Duplicate,
    /// No listener is registered for this activity's runtime type (or any
    /// of its supertypes).
    NoListener,
    /// A listener was invoked and completed (successfully, or its error was
    /// absorbed by the registered error listener without asking for retry).
    Accepted,
    /// The listener, or its error listener, asked the sender to retry.
    Retry,
}

/// Inbound activity processing: verify, deduplicate, and dispatch to a
/// [`ListenerRegistry`].
///
/// `C` is the embedder-defined context type threaded through to every
/// listener (send helpers, application state, and so on) — this crate
/// never constructs one itself.
pub struct InboxPipeline<C> {
    loader: Arc<dyn DocumentLoader>,
    dedup: InboxDeduplicator,
    verify_options: VerifyOptions,
    listeners: ListenerRegistry<C>,
}

impl<C: Send + Sync> InboxPipeline<C> {
    /// Build a pipeline backed by `loader` for dereferencing verification
    /// keys, `dedup_store` for suppressing re-delivery per `config`'s
    /// window, and `listeners` for dispatch.
    #[must_use]
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        dedup_store: Arc<dyn KvStore>,
        config: &InboxConfig,
        listeners: ListenerRegistry<C>,
    ) -> Self {
        Self {
            loader,
            dedup: InboxDeduplicator::new(dedup_store, config.dedup_window_hours * 3_600),
            verify_options: VerifyOptions::default(),
            listeners,
        }
    }

    /// Process one inbound POST: parse, verify, deduplicate, and dispatch.
    ///
    /// `recipient` is the inbox's own local identifier (an actor handle for
    /// a personal inbox, `None` for the shared inbox) — forwarded to
    /// whichever listener is invoked, not used by the pipeline itself.
    pub async fn receive(
        &self,
        body: &[u8],
        method: &str,
        path_and_query: &str,
        headers: &HeaderMap,
        recipient: Option<&str>,
        context: Arc<C>,
    ) -> InboxOutcome {
        let Ok(document) = serde_json::from_slice::<serde_json::Value>(body) else {
            return InboxOutcome::Malformed;
        };
        let Ok(activity) = fedi_vocab::decode::<Activity>(document.clone()) else {
            return InboxOutcome::Malformed;
        };

        let verified_via = match verify_activity(&document, method, path_and_query, headers, body, self.loader.as_ref(), &self.verify_options).await {
            Ok(via) => via,
            Err(err) => {
                tracing::warn!(error = %err, "inbox verification failed at the network layer");
                None
            }
        };
        let Some(verified_via) = verified_via else {
            self.record(&activity, None, false, false);
            return InboxOutcome::Unverified;
        };

        if let Some(id) = activity.entity().id() {
            if self.dedup.is_duplicate(id).await {
                self.record(&activity, Some(verified_via), true, false);
                return InboxOutcome::Duplicate;
            }
        }

        let Some(listener) = self.listeners.resolve(activity.entity()).cloned() else {
            self.record(&activity, Some(verified_via), false, false);
            return InboxOutcome::NoListener;
        };

        self.record(&activity, Some(verified_via), false, true);
        match listener.call(activity.entity(), recipient, &context).await {
            Ok(ListenerOutcome::Handled) => InboxOutcome::Accepted,
            Ok(ListenerOutcome::Retry) => InboxOutcome::Retry,
            Err(reason) => self.handle_listener_error(&activity, reason, context).await,
        }
    }

    async fn handle_listener_error(&self, activity: &Activity, reason: String, context: Arc<C>) -> InboxOutcome {
        let activity_type = activity.entity().type_name().to_string();
        let err = InboxError::ListenerFailed { activity_type: activity_type.clone(), reason: reason.clone() };
        tracing::error!(activity_type = %activity_type, reason = %reason, "{err}");
        match self.listeners.error_listener() {
            Some(handler) => match handler(&activity_type, reason, context).await {
                ListenerOutcome::Handled => InboxOutcome::Accepted,
                ListenerOutcome::Retry => InboxOutcome::Retry,
            },
            None => InboxOutcome::Accepted,
        }
    }

    fn record(&self, activity: &Activity, verified_via: Option<fedi_telemetry::VerificationMethod>, deduplicated: bool, dispatched: bool) {
        let metrics = InboxMetrics {
            activity_type: activity.entity().type_name().to_string(),
            verified_via,
            deduplicated,
            dispatched,
        };
        info!(?metrics, "inbox activity processed");
    }
}

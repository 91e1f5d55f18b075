//! [`DeliveryJob`]: the self-contained payload one outbox queue message
//! carries, and the exponential-backoff-with-jitter schedule retries follow.

use fedi_config::DeliveryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One activity's delivery to one inbox.
///
/// Carries everything a worker needs to retry independently of every other
/// job: the target, the wire body, and which local recipients it serves
/// (for diagnostics; delivery itself doesn't address individual recipients
/// once folded behind a shared inbox).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryJob {
    /// The inbox URL to POST to (personal or shared).
    pub inbox: String,
    /// `true` if `inbox` is a shared inbox.
    pub shared: bool,
    /// The compact JSON-LD body to send.
    pub activity_json: serde_json::Value,
    /// The id of the local actor the delivery is signed as. Resolved to
    /// signing key material at delivery time via a
    /// [`crate::worker::SenderKeyProvider`] — this job payload never itself
    /// carries private key bytes.
    pub sender_actor_id: String,
    /// The `id` of every recipient this job's inbox serves.
    pub recipient_ids: Vec<String>,
    /// The activity's own `id`, if it has one.
    pub activity_id: Option<String>,
    /// The activity's compact `type`, for logging and error-sink context.
    pub activity_type: String,
    /// How many delivery attempts have already been made (0 on first
    /// enqueue).
    pub attempt: u32,
}

/// The outcome of one delivery attempt, deciding whether the job should be
/// retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The remote responded 2xx.
    Success,
    /// The remote responded with a status, a transport error, or a timeout
    /// that warrants another attempt.
    Retry,
    /// The remote rejected the activity in a way no retry would fix (e.g.
    /// 404, 410).
    Terminal,
}

/// Classify an HTTP response status per the wire protocol's retry policy:
/// any 2xx succeeds; 408/429 retry; other 4xx are terminal; 5xx retries.
#[must_use]
pub fn classify_status(status: u16) -> DeliveryOutcome {
    match status {
        200..=299 => DeliveryOutcome::Success,
        408 | 429 => DeliveryOutcome::Retry,
        400..=499 => DeliveryOutcome::Terminal,
        _ => DeliveryOutcome::Retry,
    }
}

/// Compute the delay before retry number `attempt` (1-indexed: the delay
/// before the *first* retry uses `attempt = 1`), as exponential backoff with
/// up to 10% jitter, capped at `config.max_backoff_secs`.
#[must_use]
pub fn backoff(attempt: u32, config: &DeliveryConfig) -> Duration {
    let exponent = config.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
    let raw_secs = (config.initial_backoff_secs as f64 * exponent).min(config.max_backoff_secs as f64);
    let jitter = 1.0 + (rand::random::<f64>() * 0.2 - 0.1);
    Duration::from_secs_f64((raw_secs * jitter).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DeliveryConfig {
        DeliveryConfig { max_retries: 10, initial_backoff_secs: 60, max_backoff_secs: 21_600, backoff_multiplier: 2.0 }
    }

    #[test]
    fn classify_2xx_is_success() {
        assert_eq!(classify_status(202), DeliveryOutcome::Success);
    }

    #[test]
    fn classify_404_is_terminal() {
        assert_eq!(classify_status(404), DeliveryOutcome::Terminal);
    }

    #[test]
    fn classify_429_is_retry() {
        assert_eq!(classify_status(429), DeliveryOutcome::Retry);
    }

    #[test]
    fn classify_503_is_retry() {
        assert_eq!(classify_status(503), DeliveryOutcome::Retry);
    }

    #[test]
    fn backoff_grows_exponentially_and_respects_cap() {
        let cfg = config();
        let first = backoff(1, &cfg).as_secs_f64();
        let fourth = backoff(4, &cfg).as_secs_f64();
        assert!(first < fourth);
        let tenth = backoff(10, &cfg).as_secs_f64();
        assert!(tenth <= cfg.max_backoff_secs as f64 * 1.1);
    }

    #[test]
    fn backoff_never_goes_negative() {
        let cfg = config();
        for attempt in 0..20 {
            assert!(backoff(attempt, &cfg).as_secs_f64() >= 0.0);
        }
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structured telemetry and metrics collection for the federation runtime.
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Covers the two traffic directions the runtime cares about: inbound
//! verification outcomes (`InboxMetrics`) and outbound delivery attempts
//! (`DeliveryMetrics`), plus a small `tracing-subscriber` init helper so
//! embedders get structured logs without assembling a subscriber themselves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::info;

// ---------------------------------------------------------------------------
// DeliveryMetrics
// ---------------------------------------------------------------------------

/// Metrics captured for a single outbound delivery attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeliveryMetrics {
    /// Target inbox URL (personal or shared).
    pub inbox: String,
    /// Activity type being delivered (`"Create"`, `"Follow"`, …).
    pub activity_type: String,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// Wall-clock duration of the HTTP POST in milliseconds.
    pub duration_ms: u64,
    /// HTTP status code received, if any.
    pub status: Option<u16>,
    /// Whether this attempt was a shared-inbox delivery.
    pub shared_inbox: bool,
    /// Number of distinct recipient actor ids folded into this job.
    pub recipient_count: u64,
}

// ---------------------------------------------------------------------------
// DeliverySummary
// ---------------------------------------------------------------------------

/// Aggregated statistics across multiple delivery attempts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliverySummary {
    /// Number of attempts recorded.
    pub count: usize,
    /// Mean duration in milliseconds.
    pub mean_duration_ms: f64,
    /// Median (p50) duration in milliseconds.
    pub p50_duration_ms: f64,
    /// 99th-percentile duration in milliseconds.
    pub p99_duration_ms: f64,
    /// Fraction of attempts whose status was not a success (2xx).
    pub failure_rate: f64,
    /// Per-inbox attempt counts (deterministic ordering).
    pub inbox_counts: BTreeMap<String, usize>,
}

impl Default for DeliverySummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean_duration_ms: 0.0,
            p50_duration_ms: 0.0,
            p99_duration_ms: 0.0,
            failure_rate: 0.0,
            inbox_counts: BTreeMap::new(),
        }
    }
}

/// Compute a percentile value from a **sorted** slice.
fn percentile(sorted: &[u64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0] as f64;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] as f64 * (1.0 - frac) + sorted[upper] as f64 * frac
}

fn is_success(status: Option<u16>) -> bool {
    matches!(status, Some(s) if (200..300).contains(&s))
}

// ---------------------------------------------------------------------------
// DeliveryMetricsCollector
// ---------------------------------------------------------------------------

/// Thread-safe collector for outbound delivery metrics.
///
/// Wrap in an `Arc` to share across queue workers (the inner storage is
/// already behind a `Mutex`).
#[derive(Debug, Clone)]
pub struct DeliveryMetricsCollector {
    inner: Arc<Mutex<Vec<DeliveryMetrics>>>,
}

impl Default for DeliveryMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryMetricsCollector {
    /// Create a new, empty collector.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record a completed delivery attempt.
    pub fn record(&self, metrics: DeliveryMetrics) {
        let mut data = self.inner.lock().expect("metrics lock poisoned");
        data.push(metrics);
    }

    /// Return all recorded attempts.
    pub fn attempts(&self) -> Vec<DeliveryMetrics> {
        let data = self.inner.lock().expect("metrics lock poisoned");
        data.clone()
    }

    /// Number of attempts recorded so far.
    pub fn len(&self) -> usize {
        let data = self.inner.lock().expect("metrics lock poisoned");
        data.len()
    }

    /// Whether the collector has no recorded attempts.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute an aggregated summary of all recorded attempts.
    pub fn summary(&self) -> DeliverySummary {
        let data = self.inner.lock().expect("metrics lock poisoned");
        if data.is_empty() {
            return DeliverySummary::default();
        }

        let count = data.len();
        let mut durations: Vec<u64> = data.iter().map(|r| r.duration_ms).collect();
        durations.sort_unstable();

        let total_duration: u64 = durations.iter().sum();
        let mean_duration_ms = total_duration as f64 / count as f64;
        let p50_duration_ms = percentile(&durations, 50.0);
        let p99_duration_ms = percentile(&durations, 99.0);

        let failures = data.iter().filter(|r| !is_success(r.status)).count();
        let failure_rate = failures as f64 / count as f64;

        let mut inbox_counts: BTreeMap<String, usize> = BTreeMap::new();
        for r in data.iter() {
            *inbox_counts.entry(r.inbox.clone()).or_insert(0) += 1;
        }

        DeliverySummary {
            count,
            mean_duration_ms,
            p50_duration_ms,
            p99_duration_ms,
            failure_rate,
            inbox_counts,
        }
    }

    /// Clear all recorded metrics.
    pub fn clear(&self) {
        let mut data = self.inner.lock().expect("metrics lock poisoned");
        data.clear();
    }
}

// ---------------------------------------------------------------------------
// InboxMetrics
// ---------------------------------------------------------------------------

/// Outcome of verifying and dispatching a single inbound activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboxMetrics {
    /// Activity type received.
    pub activity_type: String,
    /// Which mechanism verified the request, if any.
    pub verified_via: Option<VerificationMethod>,
    /// Whether the activity was a dedup-suppressed re-delivery.
    pub deduplicated: bool,
    /// Whether a listener was found and invoked.
    pub dispatched: bool,
}

/// Mechanism that verified an inbound activity's authenticity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// FEP-8b32 Object Integrity Proof.
    IntegrityProof,
    /// Legacy Linked Data Signature.
    LdSignature,
    /// Draft-Cavage HTTP Signature.
    HttpSignature,
}

// ---------------------------------------------------------------------------
// TelemetrySpan
// ---------------------------------------------------------------------------

/// A structured span for tracing integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySpan {
    /// Span name / operation.
    pub name: String,
    /// Arbitrary key-value attributes (deterministic ordering).
    pub attributes: BTreeMap<String, String>,
}

impl TelemetrySpan {
    /// Create a new span with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Insert an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Emit the span via `tracing::info!`.
    pub fn emit(&self) {
        info!(
            span_name = %self.name,
            attributes = ?self.attributes,
            "telemetry_span"
        );
    }
}

// ---------------------------------------------------------------------------
// TelemetryExporter
// ---------------------------------------------------------------------------

/// Trait for exporting collected metrics.
pub trait TelemetryExporter: Send + Sync {
    /// Export the given summary. Returns the serialized output on success.
    fn export(&self, summary: &DeliverySummary) -> Result<String, String>;
}

/// Exports metrics as pretty-printed JSON to a string.
#[derive(Debug, Default)]
pub struct JsonExporter;

impl TelemetryExporter for JsonExporter {
    fn export(&self, summary: &DeliverySummary) -> Result<String, String> {
        serde_json::to_string_pretty(summary).map_err(|e| e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Subscriber init
// ---------------------------------------------------------------------------

/// Initialise a process-wide `tracing` subscriber reading `RUST_LOG`
/// (defaulting to `info`), writing `fmt`-formatted structured logs.
///
/// Calling this more than once is harmless; the second call is a no-op
/// because `tracing_subscriber::fmt().try_init()` refuses to replace an
/// already-installed global subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
            |_| tracing_subscriber::EnvFilter::new("info"),
        ))
        .try_init();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

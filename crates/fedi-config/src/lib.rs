// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the federation runtime.
//!
//! This crate provides [`FederationConfig`] — the top-level runtime settings —
//! together with helpers for loading from TOML files, merging overlays, and
//! producing advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// A retry backoff ceiling is unusually large.
    LargeBackoff {
        /// Backoff value in seconds.
        secs: u64,
    },
    /// The inbox dedup window is unusually short, risking duplicate dispatch
    /// under retried deliveries.
    ShortDedupWindow {
        /// Window in hours.
        hours: u64,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::LargeBackoff { secs } => {
                write!(f, "delivery.max_backoff_secs is unusually large ({secs}s)")
            }
            ConfigWarning::ShortDedupWindow { hours } => {
                write!(f, "inbox.dedup_window_hours is unusually short ({hours}h)")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level runtime configuration for a federated server.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct FederationConfig {
    /// The server's own federation domain, e.g. `"example.com"`.
    ///
    /// Used to build actor and object ids when the embedder does not
    /// override them explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Directory for persisting the durable delivery queue's on-disk state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_dir: Option<String>,

    /// `User-Agent` header sent with outgoing document-loader and delivery
    /// requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Default key algorithm for newly generated actor key pairs
    /// (`"rsa"` or `"ed25519"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_algorithm: Option<String>,

    /// Outbound delivery retry policy.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Remote document loader policy.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Inbox dedup and processing policy.
    #[serde(default)]
    pub inbox: InboxConfig,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            domain: None,
            log_level: Some("info".into()),
            queue_dir: None,
            user_agent: None,
            key_algorithm: Some("ed25519".into()),
            delivery: DeliveryConfig::default(),
            loader: LoaderConfig::default(),
            inbox: InboxConfig::default(),
        }
    }
}

/// Outbound delivery retry policy.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct DeliveryConfig {
    /// Maximum number of retry attempts before a job is dead-lettered.
    pub max_retries: u32,
    /// Initial backoff, in seconds, before the first retry.
    pub initial_backoff_secs: u64,
    /// Ceiling on backoff growth, in seconds.
    pub max_backoff_secs: u64,
    /// Multiplier applied to the backoff after each attempt.
    pub backoff_multiplier: f64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_secs: 60,
            max_backoff_secs: 21_600,
            backoff_multiplier: 2.0,
        }
    }
}

/// Remote document loader policy.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct LoaderConfig {
    /// Whether to allow dereferencing loopback/private/link-local addresses.
    ///
    /// Should only be `true` in test environments.
    pub allow_private_address: bool,
    /// Request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            allow_private_address: false,
            timeout_secs: 10,
        }
    }
}

/// Inbox dedup and processing policy.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct InboxConfig {
    /// Rolling window, in hours, during which repeated deliveries of the
    /// same activity id are suppressed as duplicates.
    pub dedup_window_hours: u64,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            dedup_window_hours: 24,
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAX_BACKOFF_CEILING_SECS: u64 = 86_400;
const LARGE_BACKOFF_THRESHOLD_SECS: u64 = 43_200;
const SHORT_DEDUP_WINDOW_THRESHOLD_HOURS: u64 = 1;
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
const VALID_KEY_ALGORITHMS: &[&str] = &["rsa", "ed25519"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`FederationConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`FederationConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<FederationConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => FederationConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`FederationConfig`].
pub fn parse_toml(content: &str) -> Result<FederationConfig, ConfigError> {
    toml::from_str::<FederationConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `FEDI_DOMAIN`
/// - `FEDI_LOG_LEVEL`
/// - `FEDI_QUEUE_DIR`
/// - `FEDI_USER_AGENT`
pub fn apply_env_overrides(config: &mut FederationConfig) {
    if let Ok(val) = std::env::var("FEDI_DOMAIN") {
        config.domain = Some(val);
    }
    if let Ok(val) = std::env::var("FEDI_LOG_LEVEL") {
        config.log_level = Some(val);
    }
    if let Ok(val) = std::env::var("FEDI_QUEUE_DIR") {
        config.queue_dir = Some(val);
    }
    if let Ok(val) = std::env::var("FEDI_USER_AGENT") {
        config.user_agent = Some(val);
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (invalid log levels, out-of-range retry/backoff settings) are
/// returned as a [`ConfigError::ValidationError`]; soft issues come back as
/// warnings.
pub fn validate_config(config: &FederationConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    if let Some(ref algo) = config.key_algorithm
        && !VALID_KEY_ALGORITHMS.contains(&algo.as_str())
    {
        errors.push(format!("invalid key_algorithm '{algo}'"));
    }

    let d = &config.delivery;
    if d.max_retries == 0 {
        errors.push("delivery.max_retries must be at least 1".into());
    }
    if d.initial_backoff_secs == 0 {
        errors.push("delivery.initial_backoff_secs must be at least 1".into());
    }
    if d.max_backoff_secs == 0 || d.max_backoff_secs > MAX_BACKOFF_CEILING_SECS {
        errors.push(format!(
            "delivery.max_backoff_secs out of range (1..{MAX_BACKOFF_CEILING_SECS})"
        ));
    } else if d.max_backoff_secs > LARGE_BACKOFF_THRESHOLD_SECS {
        warnings.push(ConfigWarning::LargeBackoff {
            secs: d.max_backoff_secs,
        });
    }
    if d.initial_backoff_secs > 0
        && d.max_backoff_secs > 0
        && d.initial_backoff_secs > d.max_backoff_secs
    {
        errors.push("delivery.initial_backoff_secs must not exceed max_backoff_secs".into());
    }
    if d.backoff_multiplier < 1.0 {
        errors.push("delivery.backoff_multiplier must be >= 1.0".into());
    }

    if config.loader.timeout_secs == 0 {
        errors.push("loader.timeout_secs must be at least 1".into());
    }

    if config.inbox.dedup_window_hours == 0 {
        errors.push("inbox.dedup_window_hours must be at least 1".into());
    } else if config.inbox.dedup_window_hours < SHORT_DEDUP_WINDOW_THRESHOLD_HOURS {
        warnings.push(ConfigWarning::ShortDedupWindow {
            hours: config.inbox.dedup_window_hours,
        });
    }

    if config.domain.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "domain".into(),
            hint: "actor ids will need to be fully qualified by the embedder".into(),
        });
    }
    if config.queue_dir.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "queue_dir".into(),
            hint: "the delivery queue will not survive a process restart".into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Values in `overlay` take precedence over `base`.
pub fn merge_configs(base: FederationConfig, overlay: FederationConfig) -> FederationConfig {
    FederationConfig {
        domain: overlay.domain.or(base.domain),
        log_level: overlay.log_level.or(base.log_level),
        queue_dir: overlay.queue_dir.or(base.queue_dir),
        user_agent: overlay.user_agent.or(base.user_agent),
        key_algorithm: overlay.key_algorithm.or(base.key_algorithm),
        delivery: if overlay.delivery == DeliveryConfig::default() {
            base.delivery
        } else {
            overlay.delivery
        },
        loader: if overlay.loader == LoaderConfig::default() {
            base.loader
        } else {
            overlay.loader
        },
        inbox: if overlay.inbox == InboxConfig::default() {
            base.inbox
        } else {
            overlay.inbox
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::field_reassign_with_default)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let cfg = FederationConfig::default();
        let warnings = validate_config(&cfg).expect("default config should be valid");
        assert!(!warnings.is_empty(), "should have advisory warnings");
    }

    #[test]
    fn default_config_has_sensible_defaults() {
        let cfg = FederationConfig::default();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
        assert_eq!(cfg.key_algorithm.as_deref(), Some("ed25519"));
        assert_eq!(cfg.inbox.dedup_window_hours, 24);
        assert_eq!(cfg.delivery.max_retries, 3);
    }

    #[test]
    fn parse_valid_toml_string() {
        let toml_str = r#"
            domain = "example.com"
            log_level = "debug"
            queue_dir = "/var/lib/fedi/queue"

            [delivery]
            max_retries = 5
            initial_backoff_secs = 30
            max_backoff_secs = 3600
            backoff_multiplier = 2.0
        "#;
        let cfg = parse_toml(toml_str).unwrap();
        assert_eq!(cfg.domain.as_deref(), Some("example.com"));
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.delivery.max_retries, 5);
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let bad = "this is [not valid toml =";
        let err = parse_toml(bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn parse_wrong_types_gives_parse_error() {
        let toml_str = r#"log_level = 42"#;
        let err = parse_toml(toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn validation_catches_invalid_log_level() {
        let cfg = FederationConfig {
            log_level: Some("verbose".into()),
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_invalid_key_algorithm() {
        let cfg = FederationConfig {
            key_algorithm: Some("dsa".into()),
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        match err {
            ConfigError::ValidationError { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("invalid key_algorithm")));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn validation_catches_zero_max_retries() {
        let mut cfg = FederationConfig::default();
        cfg.delivery.max_retries = 0;
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_zero_initial_backoff() {
        let mut cfg = FederationConfig::default();
        cfg.delivery.initial_backoff_secs = 0;
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_max_backoff_exceeding_ceiling() {
        let mut cfg = FederationConfig::default();
        cfg.delivery.max_backoff_secs = MAX_BACKOFF_CEILING_SECS + 1;
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_initial_backoff_exceeding_max() {
        let mut cfg = FederationConfig::default();
        cfg.delivery.initial_backoff_secs = 100;
        cfg.delivery.max_backoff_secs = 50;
        let err = validate_config(&cfg).unwrap_err();
        match err {
            ConfigError::ValidationError { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("must not exceed")));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn validation_catches_sub_unity_multiplier() {
        let mut cfg = FederationConfig::default();
        cfg.delivery.backoff_multiplier = 0.5;
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_zero_loader_timeout() {
        let mut cfg = FederationConfig::default();
        cfg.loader.timeout_secs = 0;
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_zero_dedup_window() {
        let mut cfg = FederationConfig::default();
        cfg.inbox.dedup_window_hours = 0;
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn short_dedup_window_produces_warning_not_error() {
        let mut cfg = FederationConfig::default();
        cfg.domain = Some("example.com".into());
        cfg.queue_dir = Some("/tmp/q".into());
        cfg.inbox.dedup_window_hours = 1;
        let warnings = validate_config(&cfg).unwrap();
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, ConfigWarning::ShortDedupWindow { .. }))
        );
    }

    #[test]
    fn large_backoff_produces_warning() {
        let mut cfg = FederationConfig::default();
        cfg.domain = Some("example.com".into());
        cfg.queue_dir = Some("/tmp/q".into());
        cfg.delivery.max_backoff_secs = 50_000;
        let warnings = validate_config(&cfg).unwrap();
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, ConfigWarning::LargeBackoff { .. }))
        );
    }

    #[test]
    fn valid_config_with_all_fields_passes() {
        let cfg = FederationConfig {
            domain: Some("example.com".into()),
            queue_dir: Some("/var/lib/fedi".into()),
            ..Default::default()
        };
        validate_config(&cfg).expect("should pass");
    }

    #[test]
    fn merge_overlay_overrides_base() {
        let base = FederationConfig {
            domain: Some("old.example".into()),
            log_level: Some("info".into()),
            ..Default::default()
        };
        let overlay = FederationConfig {
            domain: Some("new.example".into()),
            log_level: None,
            ..Default::default()
        };
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.domain.as_deref(), Some("new.example"));
        assert_eq!(merged.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn merge_preserves_base_delivery_when_overlay_is_default() {
        let mut base = FederationConfig::default();
        base.delivery.max_retries = 10;
        let merged = merge_configs(base.clone(), FederationConfig::default());
        assert_eq!(merged.delivery.max_retries, 10);
    }

    #[test]
    fn merge_overlay_delivery_wins_when_customized() {
        let mut base = FederationConfig::default();
        base.delivery.max_retries = 10;
        let mut overlay = FederationConfig::default();
        overlay.delivery.max_retries = 7;
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.delivery.max_retries, 7);
    }

    #[test]
    fn empty_string_toml_parses_to_defaults() {
        let cfg = parse_toml("").unwrap();
        assert_eq!(cfg.domain, None);
        assert_eq!(cfg.delivery.max_retries, 3);
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = FederationConfig {
            domain: Some("example.com".into()),
            queue_dir: Some("/q".into()),
            user_agent: Some("fedi/0.1".into()),
            ..Default::default()
        };
        let serialized = toml::to_string(&cfg).unwrap();
        let deserialized: FederationConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(cfg, deserialized);
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fedi.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "domain = \"example.com\"\nlog_level = \"warn\"").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.domain.as_deref(), Some("example.com"));
        assert_eq!(cfg.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn load_missing_file_gives_file_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/fedi.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn load_none_returns_default() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError::FileNotFound {
            path: "/foo".into(),
        };
        assert!(e.to_string().contains("/foo"));

        let e = ConfigError::ParseError {
            reason: "bad toml".into(),
        };
        assert!(e.to_string().contains("bad toml"));
    }

    #[test]
    fn config_warning_display() {
        let w = ConfigWarning::MissingOptionalField {
            field: "f".into(),
            hint: "h".into(),
        };
        assert!(w.to_string().contains('f'));

        let w = ConfigWarning::LargeBackoff { secs: 9999 };
        assert!(w.to_string().contains("9999"));

        let w = ConfigWarning::ShortDedupWindow { hours: 1 };
        assert!(w.to_string().contains('1'));
    }

    #[test]
    fn json_schema_can_be_generated() {
        let schema = schemars::schema_for!(FederationConfig);
        let json = serde_json::to_string_pretty(&schema).unwrap();
        assert!(json.contains("FederationConfig"));
    }
}

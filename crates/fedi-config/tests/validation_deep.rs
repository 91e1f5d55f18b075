// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deep validation tests for `fedi-config`.

use fedi_config::{
    ConfigError, ConfigWarning, DeliveryConfig, FederationConfig, merge_configs, parse_toml,
    validate_config,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fully-specified config with no validation warnings.
fn fully_valid_config() -> FederationConfig {
    FederationConfig {
        domain: Some("example.com".into()),
        queue_dir: Some("/var/lib/fedi/queue".into()),
        user_agent: Some("fedi/0.1 (+https://example.com)".into()),
        ..Default::default()
    }
}

/// Extract error reasons from a `ConfigError::ValidationError`.
fn validation_reasons(err: ConfigError) -> Vec<String> {
    match err {
        ConfigError::ValidationError { reasons } => reasons,
        other => panic!("expected ValidationError, got {other:?}"),
    }
}

// ===========================================================================
// 1. Valid configs pass validation with no warnings
// ===========================================================================

#[test]
fn fully_specified_config_has_no_warnings() {
    let warnings = validate_config(&fully_valid_config()).unwrap();
    assert!(warnings.is_empty(), "expected zero warnings: {warnings:?}");
}

#[test]
fn valid_config_all_log_levels() {
    for level in &["error", "warn", "info", "debug", "trace"] {
        let cfg = FederationConfig {
            log_level: Some((*level).into()),
            ..fully_valid_config()
        };
        validate_config(&cfg)
            .unwrap_or_else(|e| panic!("log_level '{level}' should be valid: {e}"));
    }
}

#[test]
fn valid_config_both_key_algorithms() {
    for algo in &["rsa", "ed25519"] {
        let cfg = FederationConfig {
            key_algorithm: Some((*algo).into()),
            ..fully_valid_config()
        };
        validate_config(&cfg)
            .unwrap_or_else(|e| panic!("key_algorithm '{algo}' should be valid: {e}"));
    }
}

#[test]
fn valid_delivery_at_boundary_backoff_max() {
    let mut cfg = fully_valid_config();
    cfg.delivery.max_backoff_secs = 86_400;
    // Should pass but may warn about large backoff.
    validate_config(&cfg).unwrap();
}

#[test]
fn valid_delivery_backoff_equal_to_max_allowed() {
    let mut cfg = fully_valid_config();
    cfg.delivery.initial_backoff_secs = 60;
    cfg.delivery.max_backoff_secs = 60;
    validate_config(&cfg).unwrap();
}

// ===========================================================================
// 2. Out-of-range retry/backoff settings are hard errors
// ===========================================================================

#[test]
fn max_backoff_exceeds_ceiling_is_error() {
    let mut cfg = fully_valid_config();
    cfg.delivery.max_backoff_secs = 86_401;
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("out of range")));
}

#[test]
fn max_backoff_way_over_ceiling_is_error() {
    let mut cfg = fully_valid_config();
    cfg.delivery.max_backoff_secs = u64::MAX;
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("out of range")));
}

#[test]
fn zero_max_backoff_is_error() {
    let mut cfg = fully_valid_config();
    cfg.delivery.max_backoff_secs = 0;
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("out of range")));
}

#[test]
fn zero_max_retries_is_error() {
    let mut cfg = fully_valid_config();
    cfg.delivery.max_retries = 0;
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("max_retries")));
}

#[test]
fn initial_backoff_exceeding_max_is_error() {
    let mut cfg = fully_valid_config();
    cfg.delivery.initial_backoff_secs = 7200;
    cfg.delivery.max_backoff_secs = 3600;
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("must not exceed")));
}

#[test]
fn sub_unity_backoff_multiplier_is_error() {
    let mut cfg = fully_valid_config();
    cfg.delivery.backoff_multiplier = 0.99;
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("backoff_multiplier")));
}

#[test]
fn zero_backoff_multiplier_is_error() {
    let mut cfg = fully_valid_config();
    cfg.delivery.backoff_multiplier = 0.0;
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("backoff_multiplier")));
}

// ===========================================================================
// 3. Invalid log levels and key algorithms
// ===========================================================================

#[test]
fn invalid_log_level_verbose() {
    let cfg = FederationConfig {
        log_level: Some("verbose".into()),
        ..fully_valid_config()
    };
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("invalid log_level")));
}

#[test]
fn invalid_log_level_uppercase() {
    let cfg = FederationConfig {
        log_level: Some("INFO".into()),
        ..fully_valid_config()
    };
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("invalid log_level")));
}

#[test]
fn invalid_key_algorithm_dsa() {
    let cfg = FederationConfig {
        key_algorithm: Some("dsa".into()),
        ..fully_valid_config()
    };
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("invalid key_algorithm")));
}

#[test]
fn invalid_key_algorithm_empty_string() {
    let cfg = FederationConfig {
        key_algorithm: Some(String::new()),
        ..fully_valid_config()
    };
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("invalid key_algorithm")));
}

#[test]
fn none_log_level_is_valid() {
    let cfg = FederationConfig {
        log_level: None,
        ..fully_valid_config()
    };
    validate_config(&cfg).unwrap();
}

#[test]
fn none_key_algorithm_is_valid() {
    let cfg = FederationConfig {
        key_algorithm: None,
        ..fully_valid_config()
    };
    validate_config(&cfg).unwrap();
}

// ===========================================================================
// 4. Multiple validation errors can be collected
// ===========================================================================

#[test]
fn multiple_errors_collected() {
    let mut cfg = FederationConfig {
        log_level: Some("bad_level".into()),
        key_algorithm: Some("dsa".into()),
        domain: Some("x".into()),
        queue_dir: Some("/r".into()),
        ..Default::default()
    };
    cfg.delivery.max_retries = 0;
    cfg.delivery.backoff_multiplier = 0.5;
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(
        reasons.len() >= 4,
        "expected >= 4 errors, got {}: {reasons:?}",
        reasons.len()
    );
}

// ===========================================================================
// 5. Validation warnings for non-critical issues
// ===========================================================================

#[test]
fn missing_domain_warns() {
    let cfg = FederationConfig {
        domain: None,
        queue_dir: Some("/r".into()),
        ..Default::default()
    };
    let warnings = validate_config(&cfg).unwrap();
    assert!(warnings.iter().any(|w| matches!(
        w,
        ConfigWarning::MissingOptionalField { field, .. } if field == "domain"
    )));
}

#[test]
fn missing_queue_dir_warns() {
    let cfg = FederationConfig {
        domain: Some("x".into()),
        queue_dir: None,
        ..Default::default()
    };
    let warnings = validate_config(&cfg).unwrap();
    assert!(warnings.iter().any(|w| matches!(
        w,
        ConfigWarning::MissingOptionalField { field, .. } if field == "queue_dir"
    )));
}

#[test]
fn both_optional_fields_missing_produces_two_warnings() {
    let cfg = FederationConfig {
        domain: None,
        queue_dir: None,
        ..Default::default()
    };
    let warnings = validate_config(&cfg).unwrap();
    let missing_count = warnings
        .iter()
        .filter(|w| matches!(w, ConfigWarning::MissingOptionalField { .. }))
        .count();
    assert_eq!(missing_count, 2);
}

#[test]
fn large_backoff_warning_threshold() {
    let mut cfg = fully_valid_config();
    cfg.delivery.max_backoff_secs = 43_201; // just above 43_200
    let warnings = validate_config(&cfg).unwrap();
    assert!(
        warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::LargeBackoff { secs } if *secs == 43_201))
    );
}

#[test]
fn exactly_at_threshold_no_large_backoff_warning() {
    let mut cfg = fully_valid_config();
    cfg.delivery.max_backoff_secs = 43_200;
    let warnings = validate_config(&cfg).unwrap();
    assert!(
        !warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::LargeBackoff { .. }))
    );
}

#[test]
fn short_dedup_window_produces_warning() {
    let mut cfg = fully_valid_config();
    cfg.inbox.dedup_window_hours = 1;
    let warnings = validate_config(&cfg).unwrap();
    assert!(
        warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::ShortDedupWindow { hours } if *hours == 1))
    );
}

#[test]
fn typical_dedup_window_no_warning() {
    let mut cfg = fully_valid_config();
    cfg.inbox.dedup_window_hours = 24;
    let warnings = validate_config(&cfg).unwrap();
    assert!(
        !warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::ShortDedupWindow { .. }))
    );
}

// ===========================================================================
// 6. Environment variable interaction with validation
// ===========================================================================

#[test]
fn env_override_log_level_then_validate() {
    let mut cfg = fully_valid_config();
    cfg.log_level = Some("INVALID_FROM_ENV".into());
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("invalid log_level")));
}

#[test]
fn env_override_domain_removes_warning() {
    let mut cfg = FederationConfig {
        queue_dir: Some("/r".into()),
        ..Default::default()
    };
    let w1 = validate_config(&cfg).unwrap();
    assert!(w1.iter().any(|w| matches!(
        w,
        ConfigWarning::MissingOptionalField { field, .. } if field == "domain"
    )));
    cfg.domain = Some("example.com".into());
    let w2 = validate_config(&cfg).unwrap();
    assert!(!w2.iter().any(|w| matches!(
        w,
        ConfigWarning::MissingOptionalField { field, .. } if field == "domain"
    )));
}

// ===========================================================================
// 7. Merged config validation
// ===========================================================================

#[test]
fn merged_valid_configs_still_valid() {
    let base = fully_valid_config();
    let overlay = FederationConfig {
        log_level: Some("debug".into()),
        ..Default::default()
    };
    let merged = merge_configs(base, overlay);
    validate_config(&merged).unwrap();
}

#[test]
fn merge_introduces_invalid_log_level() {
    let base = fully_valid_config();
    let overlay = FederationConfig {
        log_level: Some("banana".into()),
        ..Default::default()
    };
    let merged = merge_configs(base, overlay);
    let reasons = validation_reasons(validate_config(&merged).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("invalid log_level")));
}

#[test]
fn merge_overlay_fixes_base_delivery() {
    let mut base = fully_valid_config();
    base.delivery.max_retries = 0;
    let mut overlay_delivery = DeliveryConfig::default();
    overlay_delivery.max_retries = 5;
    let overlay = FederationConfig {
        delivery: overlay_delivery,
        ..Default::default()
    };
    let merged = merge_configs(base, overlay);
    validate_config(&merged).unwrap();
}

#[test]
fn merged_config_accumulates_warnings() {
    let base = FederationConfig {
        domain: None,
        queue_dir: None,
        ..Default::default()
    };
    let mut overlay_delivery = DeliveryConfig::default();
    overlay_delivery.max_backoff_secs = 50_000;
    let overlay = FederationConfig {
        delivery: overlay_delivery,
        ..Default::default()
    };
    let merged = merge_configs(base, overlay);
    let warnings = validate_config(&merged).unwrap();
    // At least: missing domain + missing queue_dir + large backoff
    assert!(warnings.len() >= 3, "expected >= 3 warnings: {warnings:?}");
}

// ===========================================================================
// 8. Edge cases: very long strings, special characters
// ===========================================================================

#[test]
fn very_long_domain() {
    let mut cfg = fully_valid_config();
    cfg.domain = Some("a".repeat(10_000));
    validate_config(&cfg).unwrap();
}

#[test]
fn very_long_user_agent() {
    let mut cfg = fully_valid_config();
    cfg.user_agent = Some("x".repeat(100_000));
    validate_config(&cfg).unwrap();
}

#[test]
fn unicode_in_domain() {
    let mut cfg = fully_valid_config();
    cfg.domain = Some("日本語.example".into());
    validate_config(&cfg).unwrap();
}

#[test]
fn very_long_log_level_is_invalid() {
    let cfg = FederationConfig {
        log_level: Some("x".repeat(1_000)),
        ..fully_valid_config()
    };
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("invalid log_level")));
}

// ===========================================================================
// 9. Schema conformance after validation
// ===========================================================================

#[test]
fn valid_config_serializes_to_json() {
    let cfg = fully_valid_config();
    validate_config(&cfg).unwrap();
    let json = serde_json::to_string_pretty(&cfg).unwrap();
    assert!(json.contains("\"domain\""));
    assert!(json.contains("example.com"));
}

#[test]
fn valid_config_roundtrips_via_json() {
    let cfg = fully_valid_config();
    validate_config(&cfg).unwrap();
    let json = serde_json::to_string(&cfg).unwrap();
    let back: FederationConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, back);
}

#[test]
fn default_config_roundtrips_via_json() {
    let cfg = FederationConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    let back: FederationConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, back);
}

#[test]
fn toml_roundtrip_preserves_validity() {
    let cfg = fully_valid_config();
    validate_config(&cfg).unwrap();
    let toml_str = toml::to_string(&cfg).unwrap();
    let back = parse_toml(&toml_str).unwrap();
    let warnings = validate_config(&back).unwrap();
    assert!(warnings.is_empty());
}

// ===========================================================================
// 10. Validation idempotency (validate twice = same result)
// ===========================================================================

#[test]
fn idempotent_valid_config() {
    let cfg = fully_valid_config();
    let w1 = validate_config(&cfg).unwrap();
    let w2 = validate_config(&cfg).unwrap();
    assert_eq!(w1, w2);
}

#[test]
fn idempotent_default_config() {
    let cfg = FederationConfig::default();
    let w1 = validate_config(&cfg).unwrap();
    let w2 = validate_config(&cfg).unwrap();
    assert_eq!(w1, w2);
}

#[test]
fn idempotent_invalid_config() {
    let cfg = FederationConfig {
        log_level: Some("bad".into()),
        ..fully_valid_config()
    };
    let e1 = validate_config(&cfg).unwrap_err();
    let e2 = validate_config(&cfg).unwrap_err();
    assert_eq!(validation_reasons(e1), validation_reasons(e2));
}

#[test]
fn parse_toml_delivery_missing_fields_uses_defaults_via_serde_default() {
    // Because `FederationConfig::delivery` is itself `#[serde(default)]`, a
    // TOML document omitting the `[delivery]` table entirely still parses.
    let toml_str = r#"domain = "example.com""#;
    let cfg = parse_toml(toml_str).unwrap();
    assert_eq!(cfg.delivery.max_retries, 3);
}

#[test]
fn config_warning_display_for_missing_optional() {
    let w = ConfigWarning::MissingOptionalField {
        field: "queue_dir".into(),
        hint: "the delivery queue will not survive a process restart".into(),
    };
    let s = w.to_string();
    assert!(s.contains("queue_dir"));
    assert!(s.contains("survive"));
}

#[test]
fn validation_error_display_contains_all_reasons() {
    let err = ConfigError::ValidationError {
        reasons: vec!["reason one".into(), "reason two".into()],
    };
    let s = err.to_string();
    assert!(s.contains("reason one"));
    assert!(s.contains("reason two"));
}

// crates/truth-evidence-config/tests/section_validation.rs
// ============================================================================
// Module: Config Section Validation Tests
// Description: Cross-field rules for store, audit, rulesets, and limits.
// Purpose: Ensure every section fails closed on inconsistent settings.
// ============================================================================
//! ## Overview
//! Mutates a default config one field at a time and asserts the validation
//! message, mirroring how operators see the failure.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::path::PathBuf;

use truth_evidence_config::AuditSinkKind;
use truth_evidence_config::ConfigError;
use truth_evidence_config::EvidenceStoreType;
use truth_evidence_config::MAX_BUNDLE_LIMIT_BYTES;
use truth_evidence_config::MIN_BUNDLE_LIMIT_BYTES;
use truth_evidence_config::TruthEvidenceConfig;
use truth_evidence_core::RulesetVersion;

use crate::common::minimal_config;

/// Result alias for validation assertions.
type TestResult = Result<(), String>;

/// Asserts the validation error contains the expected message.
fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}

/// Tests the memory store rejects a path.
#[test]
fn test_memory_store_rejects_path() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.store.path = Some(PathBuf::from("evidence.db"));
    assert_invalid(config.validate(), "memory store must not set path")
}

/// Tests the sqlite store requires a non-empty path.
#[test]
fn test_sqlite_store_requires_path() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.store.store_type = EvidenceStoreType::Sqlite;
    assert_invalid(config.validate(), "sqlite store requires path")?;
    config.store.path = Some(PathBuf::from("  "));
    assert_invalid(config.validate(), "store.path must be non-empty")
}

/// Tests the sqlite busy timeout is bounded.
#[test]
fn test_sqlite_busy_timeout_is_bounded() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.store.store_type = EvidenceStoreType::Sqlite;
    config.store.path = Some(PathBuf::from("evidence.db"));
    config.store.busy_timeout_ms = 60_001;
    assert_invalid(config.validate(), "store.busy_timeout_ms must be at most 60000")
}

/// Tests the file audit sink requires a path.
#[test]
fn test_file_audit_sink_requires_path() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.audit.sink = AuditSinkKind::File;
    assert_invalid(config.validate(), "file audit sink requires path")
}

/// Tests non-file audit sinks reject a path.
#[test]
fn test_stderr_audit_sink_rejects_path() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.audit.sink = AuditSinkKind::None;
    config.audit.path = Some(PathBuf::from("audit.jsonl"));
    assert_invalid(config.validate(), "audit.path is only valid for the file sink")
}

/// Tests unknown ruleset versions are rejected.
#[test]
fn test_unknown_ruleset_is_rejected() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.rulesets.current = Some("2.0.0".to_string());
    assert_invalid(config.validate(), "rulesets.current names unknown ruleset 2.0.0")?;
    config.rulesets.current = Some(" ".to_string());
    assert_invalid(config.validate(), "rulesets.current must be non-empty")
}

/// Tests built-in ruleset versions are accepted.
#[test]
fn test_builtin_rulesets_are_accepted() {
    for version in ["1.0.0", "1.1.0"] {
        let toml = format!("[rulesets]\ncurrent = \"{version}\"\n");
        let config = TruthEvidenceConfig::from_toml_str(&toml).unwrap();
        assert_eq!(config.rulesets.current_version(), Some(RulesetVersion::new(version)));
    }
}

/// Tests the bundle limit bounds are inclusive.
#[test]
fn test_bundle_limit_bounds() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    for accepted in [MIN_BUNDLE_LIMIT_BYTES, MAX_BUNDLE_LIMIT_BYTES] {
        config.limits.max_bundle_bytes = accepted;
        config.validate().map_err(|err| err.to_string())?;
    }
    config.limits.max_bundle_bytes = MIN_BUNDLE_LIMIT_BYTES - 1;
    assert_invalid(config.validate(), "limits.max_bundle_bytes must be between")?;
    config.limits.max_bundle_bytes = MAX_BUNDLE_LIMIT_BYTES + 1;
    assert_invalid(config.validate(), "limits.max_bundle_bytes must be between")
}

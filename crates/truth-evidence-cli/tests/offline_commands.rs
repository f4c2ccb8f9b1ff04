// crates/truth-evidence-cli/tests/offline_commands.rs
// ============================================================================
// Module: CLI Offline Command Tests
// Description: Integration tests for hash, seal, regenerate, verify, shadow.
// Purpose: Ensure offline commands reproduce verdicts and fail closed.
// Dependencies: truth-evidence binary
// ============================================================================

//! ## Overview
//! Runs the CLI binary against bundle files produced by its own `seal`
//! command, then tampers with them to check exit codes and reports.

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

use std::fs;

use serde_json::json;

use crate::common::run_cli;
use crate::common::seal_bundle;
use crate::common::stderr_text;
use crate::common::stdout_json;
use crate::common::to_legacy_v1;
use crate::common::write_config;
use crate::common::write_json;

/// Config selecting ruleset 1.0.0 for new evidence.
const LEGACY_RULESET_CONFIG: &str = "[audit]\nsink = \"none\"\n\n[rulesets]\ncurrent = \"1.0.0\"\n";

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Tests a freshly sealed bundle verifies with exit code zero.
#[test]
fn cli_verify_passes_for_sealed_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = seal_bundle(dir.path(), "ev-1", "tenant-a", None);
    assert_eq!(bundle["rulesetVersion"], "1.1.0");
    assert_eq!(bundle["schemaVersion"], "3");
    assert_eq!(bundle["outputTruthMetadata"]["validityStatus"], "DEGRADED");
    assert_eq!(bundle["outputTruthMetadata"]["confidenceLevel"], "MEDIUM");

    let path = write_json(dir.path(), "bundle.json", &bundle);
    let output = run_cli(dir.path(), &["verify", path.to_str().unwrap()]);
    assert!(output.status.success(), "verify failed: {}", stderr_text(&output));
    let report = stdout_json(&output);
    assert_eq!(report["status"], "pass");
    assert_eq!(report["matches"], true);
    assert_eq!(report["pinnedRulesetVersion"], "1.1.0");
    assert_eq!(report["differences"], json!([]));
}

/// Tests a tampered verdict fails verification with exit code one.
#[test]
fn cli_verify_fails_for_tampered_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let mut bundle = seal_bundle(dir.path(), "ev-2", "tenant-a", None);
    bundle["outputTruthMetadata"]["completenessPercent"] = json!(100);

    let path = write_json(dir.path(), "bundle.json", &bundle);
    let output = run_cli(dir.path(), &["verify", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let report = stdout_json(&output);
    assert_eq!(report["status"], "fail");
    assert_eq!(report["matches"], false);
    let fields: Vec<&str> = report["differences"]
        .as_array()
        .unwrap()
        .iter()
        .map(|difference| difference["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["completenessPercent", "bundleHash"]);
}

/// Tests `hash` reports the embedded digest status and fails on mismatch.
#[test]
fn cli_hash_checks_embedded_digest() {
    let dir = tempfile::tempdir().unwrap();
    let mut bundle = seal_bundle(dir.path(), "ev-3", "tenant-a", None);
    let path = write_json(dir.path(), "bundle.json", &bundle);
    let output = run_cli(dir.path(), &["hash", path.to_str().unwrap()]);
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["evidenceId"], "ev-3");
    assert_eq!(report["matchesEmbedded"], true);
    assert_eq!(report["bundleHash"], bundle["bundleHash"]);

    bundle["cloudId"] = json!("cloud-002");
    let path = write_json(dir.path(), "tampered.json", &bundle);
    let output = run_cli(dir.path(), &["hash", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["matchesEmbedded"], false);
}

/// Tests a schema-1 bundle without a pin regenerates under the legacy ruleset.
#[test]
fn cli_regenerate_migrates_legacy_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "legacy.toml", LEGACY_RULESET_CONFIG);
    let sealed = seal_bundle(dir.path(), "ev-legacy", "tenant-a", Some(&config));
    let legacy = to_legacy_v1(&sealed);
    let path = write_json(dir.path(), "legacy.json", &legacy);

    let output = run_cli(dir.path(), &["regenerate", path.to_str().unwrap()]);
    assert!(output.status.success(), "regenerate failed: {}", stderr_text(&output));
    let report = stdout_json(&output);
    assert_eq!(report["evidenceId"], "ev-legacy");
    assert_eq!(report["clearance"]["pinnedRuleset"], "1.0.0");
    assert_eq!(report["clearance"]["rulesetDefaulted"], true);
    assert_eq!(report["clearance"]["schemaVersion"], "1");
    assert_eq!(report["verdict"], sealed["outputTruthMetadata"]);

    let output = run_cli(dir.path(), &["verify", path.to_str().unwrap()]);
    assert!(output.status.success(), "legacy verify failed: {}", stderr_text(&output));
    assert_eq!(stdout_json(&output)["status"], "pass");
}

/// Tests shadow evaluation surfaces the warnings added by the current ruleset.
#[test]
fn cli_shadow_reports_ruleset_differences() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "legacy.toml", LEGACY_RULESET_CONFIG);
    let sealed = seal_bundle(dir.path(), "ev-shadow", "tenant-a", Some(&config));
    assert_eq!(sealed["rulesetVersion"], "1.0.0");
    let path = write_json(dir.path(), "bundle.json", &sealed);

    let output = run_cli(
        dir.path(),
        &[
            "shadow",
            "--tenant",
            "tenant-a",
            "--evaluated-at",
            "2025-03-02T00:00:00Z",
            path.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "shadow failed: {}", stderr_text(&output));
    let result = stdout_json(&output);
    assert_eq!(result["status"], "DIFFERS");
    assert_eq!(result["pinnedRulesetVersion"], "1.0.0");
    assert_eq!(result["shadowRulesetVersion"], "1.1.0");
    assert_eq!(result["evaluatedAt"], "2025-03-02T00:00:00Z");
    let fields: Vec<&str> = result["differences"]
        .as_array()
        .unwrap()
        .iter()
        .map(|difference| difference["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["warnings"]);

    let output = run_cli(dir.path(), &["verify", path.to_str().unwrap()]);
    assert!(output.status.success(), "pinned verify failed: {}", stderr_text(&output));
}

/// Tests shadow evaluation refuses a tenant that does not own the bundle.
#[test]
fn cli_shadow_rejects_foreign_tenant() {
    let dir = tempfile::tempdir().unwrap();
    let sealed = seal_bundle(dir.path(), "ev-tenant", "tenant-a", None);
    let path = write_json(dir.path(), "bundle.json", &sealed);

    let output = run_cli(dir.path(), &["shadow", "--tenant", "tenant-b", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(stderr_text(&output).contains("not owned by tenant tenant-b"));
}

/// Tests `rulesets list` reports both built-in rulesets and the current one.
#[test]
fn cli_rulesets_list_reports_current() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["rulesets", "list"]);
    assert!(output.status.success());
    let summaries = stdout_json(&output);
    let entries: Vec<(&str, bool)> = summaries
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| (entry["version"].as_str().unwrap(), entry["current"].as_bool().unwrap()))
        .collect();
    assert_eq!(entries, vec![("1.0.0", false), ("1.1.0", true)]);

    let config = write_config(dir.path(), "legacy.toml", LEGACY_RULESET_CONFIG);
    let config_arg = config.to_str().unwrap();
    let output = run_cli(dir.path(), &["rulesets", "list", "--config", config_arg]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)[0]["current"], true);
}

/// Tests an unknown pinned ruleset fails regeneration without output.
#[test]
fn cli_regenerate_rejects_unknown_ruleset() {
    let dir = tempfile::tempdir().unwrap();
    let mut sealed = seal_bundle(dir.path(), "ev-pin", "tenant-a", None);
    sealed["rulesetVersion"] = json!("9.9.9");
    let path = write_json(dir.path(), "bundle.json", &sealed);

    let output = run_cli(dir.path(), &["regenerate", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(stderr_text(&output).contains("regeneration failed"));
}

/// Tests inputs above the read limit are rejected before parsing.
#[test]
fn cli_rejects_oversized_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.json");
    fs::write(&path, vec![b' '; 4 * 1024 * 1024 + 1]).unwrap();

    let output = run_cli(dir.path(), &["verify", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr_text(&output).contains("is too large"));
}

/// Tests `--version` prints the package version.
#[test]
fn cli_version_flag_prints_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("truth-evidence "));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

// crates/truth-evidence-cli/tests/store_commands.rs
// ============================================================================
// Module: CLI Store Command Tests
// Description: Integration tests for the durable store and config commands.
// Purpose: Ensure store workflows persist, audit, and fail closed.
// Dependencies: truth-evidence binary
// ============================================================================

//! ## Overview
//! Drives `store` and `config` commands against a `SQLite` database and a
//! file audit sink inside a scratch directory.

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
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;
use serde_json::json;

use crate::common::run_cli;
use crate::common::seal_bundle;
use crate::common::seal_request;
use crate::common::stderr_text;
use crate::common::stdout_json;
use crate::common::write_config;
use crate::common::write_json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Writes a sqlite store config with a file audit sink.
fn sqlite_config(dir: &Path) -> PathBuf {
    let content = format!(
        "[store]\ntype = \"sqlite\"\npath = \"{}\"\n\n[audit]\nsink = \"file\"\npath = \"{}\"\n",
        dir.join("evidence.db").display(),
        dir.join("audit.jsonl").display(),
    );
    write_config(dir, "truth-evidence.toml", &content)
}

/// Returns the event labels recorded in the audit log.
fn audit_events(dir: &Path) -> Vec<String> {
    let log = fs::read_to_string(dir.join("audit.jsonl")).unwrap_or_default();
    log.lines()
        .map(|line| {
            let event: Value = serde_json::from_str(line).unwrap();
            event["event"].as_str().unwrap().to_string()
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Tests put, get, verify, regenerate, and list against a sqlite store.
#[test]
fn cli_store_round_trip_is_audited() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path());
    let config_arg = config.to_str().unwrap();
    let request = write_json(dir.path(), "request.json", &seal_request("ev-1", "tenant-a"));
    let request_arg = request.to_str().unwrap();

    let output = run_cli(dir.path(), &["store", "put", request_arg, "--config", config_arg]);
    assert!(output.status.success(), "put failed: {}", stderr_text(&output));
    let written = stdout_json(&output);
    assert_eq!(written["evidenceId"], "ev-1");
    assert_eq!(written["inserted"], true);

    let output = run_cli(dir.path(), &["store", "put", request_arg, "--config", config_arg]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["inserted"], false);

    let output = run_cli(dir.path(), &["store", "get", "ev-1", "--config", config_arg]);
    assert!(output.status.success(), "get failed: {}", stderr_text(&output));
    let stored = stdout_json(&output);
    assert_eq!(stored["bundleHash"], written["bundleHash"]);
    assert_eq!(stored["tenantKey"], "tenant-a");

    let output = run_cli(dir.path(), &["store", "verify", "ev-1", "--config", config_arg]);
    assert!(output.status.success(), "verify failed: {}", stderr_text(&output));
    assert_eq!(stdout_json(&output)["status"], "pass");

    let output = run_cli(dir.path(), &["store", "regenerate", "ev-1", "--config", config_arg]);
    assert!(output.status.success(), "regenerate failed: {}", stderr_text(&output));
    assert_eq!(stdout_json(&output)["verdict"], stored["outputTruthMetadata"]);

    let output = run_cli(dir.path(), &["store", "list", "--config", config_arg]);
    assert!(output.status.success());
    let listing = stdout_json(&output);
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert_eq!(listing[0]["evidence_id"], "ev-1");
    assert_eq!(listing[0]["hash_algorithm"], "sha256");

    assert_eq!(
        audit_events(dir.path()),
        vec![
            "evidence_sealed",
            "evidence_sealed",
            "evidence_verified",
            "evidence_regenerated"
        ]
    );
}

/// Tests shadow evaluation of a stored bundle leaves the store unchanged.
#[test]
fn cli_store_shadow_is_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path());
    let config_arg = config.to_str().unwrap();
    let request = write_json(dir.path(), "request.json", &seal_request("ev-2", "tenant-a"));
    let output =
        run_cli(dir.path(), &["store", "put", request.to_str().unwrap(), "--config", config_arg]);
    assert!(output.status.success(), "put failed: {}", stderr_text(&output));
    let get_args = ["store", "get", "ev-2", "--config", config_arg];
    let before = stdout_json(&run_cli(dir.path(), &get_args));

    let output = run_cli(
        dir.path(),
        &[
            "store",
            "shadow",
            "--tenant",
            "tenant-a",
            "--evaluated-at",
            "2025-03-02T00:00:00Z",
            "ev-2",
            "--config",
            config_arg,
        ],
    );
    assert!(output.status.success(), "shadow failed: {}", stderr_text(&output));
    assert_eq!(stdout_json(&output)["status"], "IDENTICAL");

    let output = run_cli(
        dir.path(),
        &["store", "shadow", "--tenant", "tenant-b", "ev-2", "--config", config_arg],
    );
    assert!(!output.status.success());

    let after = stdout_json(&run_cli(dir.path(), &get_args));
    assert_eq!(before, after);
    let events = audit_events(dir.path());
    assert_eq!(events.last().map(String::as_str), Some("regeneration_failed"));
    assert!(events.iter().any(|event| event == "shadow_evaluated"));
}

/// Tests import accepts sealed bundles and refuses tampered ones.
#[test]
fn cli_store_import_checks_digest() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path());
    let config_arg = config.to_str().unwrap();
    let mut bundle = seal_bundle(dir.path(), "ev-3", "tenant-a", None);

    bundle["outputTruthMetadata"]["confidenceLevel"] = json!("HIGH");
    let tampered = write_json(dir.path(), "tampered.json", &bundle);
    let output = run_cli(
        dir.path(),
        &["store", "import", tampered.to_str().unwrap(), "--config", config_arg],
    );
    assert!(!output.status.success());
    assert!(stderr_text(&output).contains("refusing to import"));

    bundle["outputTruthMetadata"]["confidenceLevel"] = json!("MEDIUM");
    let intact = write_json(dir.path(), "intact.json", &bundle);
    let output =
        run_cli(dir.path(), &["store", "import", intact.to_str().unwrap(), "--config", config_arg]);
    assert!(output.status.success(), "import failed: {}", stderr_text(&output));
    assert_eq!(stdout_json(&output)["inserted"], true);

    let output = run_cli(dir.path(), &["store", "verify", "ev-3", "--config", config_arg]);
    assert!(output.status.success());
}

/// Tests a rejected write reports the digest of the record already stored.
#[test]
fn cli_store_put_reports_existing_digest() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path());
    let config_arg = config.to_str().unwrap();
    let request = write_json(dir.path(), "request.json", &seal_request("ev-4", "tenant-a"));
    let output =
        run_cli(dir.path(), &["store", "put", request.to_str().unwrap(), "--config", config_arg]);
    assert!(output.status.success(), "put failed: {}", stderr_text(&output));
    let first = stdout_json(&output);

    let mut changed = seal_request("ev-4", "tenant-a");
    changed["cloudId"] = json!("cloud-999");
    let changed = write_json(dir.path(), "changed.json", &changed);
    let output =
        run_cli(dir.path(), &["store", "put", changed.to_str().unwrap(), "--config", config_arg]);
    assert!(output.status.success(), "second put failed: {}", stderr_text(&output));
    let second = stdout_json(&output);
    assert_eq!(second["inserted"], false);
    assert_eq!(second["bundleHash"], first["bundleHash"]);

    let other = seal_bundle(dir.path(), "ev-4", "tenant-b", None);
    assert_ne!(other["bundleHash"], first["bundleHash"]);
    let other = write_json(dir.path(), "other.json", &other);
    let output =
        run_cli(dir.path(), &["store", "import", other.to_str().unwrap(), "--config", config_arg]);
    assert!(output.status.success(), "import failed: {}", stderr_text(&output));
    let imported = stdout_json(&output);
    assert_eq!(imported["inserted"], false);
    assert_eq!(imported["bundleHash"], first["bundleHash"]);

    let get_args = ["store", "get", "ev-4", "--config", config_arg];
    let stored = stdout_json(&run_cli(dir.path(), &get_args));
    assert_eq!(stored["bundleHash"], first["bundleHash"]);
    assert_eq!(stored["cloudId"], "cloud-001");
}

/// Tests a missing id is reported as not found.
#[test]
fn cli_store_get_missing_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path());
    let output =
        run_cli(dir.path(), &["store", "get", "ev-missing", "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr_text(&output).contains("evidence bundle not found: ev-missing"));
}

/// Tests store commands refuse the non-persistent memory backend.
#[test]
fn cli_store_requires_sqlite_backend() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "memory.toml", "[store]\ntype = \"memory\"\n");
    let output =
        run_cli(dir.path(), &["store", "list", "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr_text(&output).contains("store commands require a sqlite store"));
}

/// Tests store commands pick up the default config file in the working dir.
#[test]
fn cli_store_uses_default_config_name() {
    let dir = tempfile::tempdir().unwrap();
    sqlite_config(dir.path());
    let output = run_cli(dir.path(), &["store", "list"]);
    assert!(output.status.success(), "list failed: {}", stderr_text(&output));
    assert_eq!(stdout_json(&output), json!([]));
}

/// Tests config validation succeeds and fails closed.
#[test]
fn cli_config_validate_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    let valid = sqlite_config(dir.path());
    let output = run_cli(dir.path(), &["config", "validate", "--config", valid.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("config valid"));

    let invalid = write_config(dir.path(), "bad.toml", "[rulesets]\ncurrent = \"2.0.0\"\n");
    let output =
        run_cli(dir.path(), &["config", "validate", "--config", invalid.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr_text(&output).contains("unknown ruleset 2.0.0"));
}

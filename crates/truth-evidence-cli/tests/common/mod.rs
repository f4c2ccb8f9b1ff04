// crates/truth-evidence-cli/tests/common/mod.rs
// ============================================================================
// Module: CLI Test Helpers
// Description: Binary invocation and fixture helpers for CLI tests.
// Purpose: Keep CLI integration suites focused on command behavior.
// Dependencies: truth-evidence binary, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Every invocation clears the config environment override and runs inside a
//! scratch directory so no ambient `truth-evidence.toml` leaks into a test.

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;
use serde_json::json;

/// Environment variable overriding the config path.
const CONFIG_ENV_VAR: &str = "TRUTH_EVIDENCE_CONFIG";

/// Returns the path of the built CLI binary.
pub fn truth_evidence_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_truth-evidence"))
}

/// Runs the CLI in `cwd` with the provided arguments.
pub fn run_cli(cwd: &Path, args: &[&str]) -> Output {
    Command::new(truth_evidence_bin())
        .current_dir(cwd)
        .env_remove(CONFIG_ENV_VAR)
        .args(args)
        .output()
        .expect("run truth-evidence")
}

/// Parses stdout as a single JSON document.
pub fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "stdout is not json ({err}): {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

/// Returns stderr as text.
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Writes a JSON value to `dir/name` and returns the path.
pub fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec_pretty(value).expect("encode json")).expect("write json");
    path
}

/// Writes a config file to `dir/name` and returns the path.
pub fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write config");
    path
}

/// Returns a seal request with unknown drift and a missing billing dataset.
pub fn seal_request(evidence_id: &str, tenant_key: &str) -> Value {
    json!({
        "evidenceId": evidence_id,
        "tenantKey": tenant_key,
        "cloudId": "cloud-001",
        "createdAt": "2025-03-01T12:00:05Z",
        "generatedAt": "2025-03-01T12:00:00Z",
        "snapshotRefs": [{
            "snapshotId": "snap-001",
            "snapshotHash": "abc123",
            "capturedAt": "2025-03-01T06:00:00Z",
            "type": "full"
        }],
        "driftStatusAtGeneration": {
            "driftDetectedCount": 0,
            "driftStatusSummary": "no drift observed"
        },
        "driftStatus": "NO_DRIFT",
        "validityWindowSeconds": 86_400,
        "missingData": [{
            "datasetName": "billing",
            "reasonCode": "API_FORBIDDEN",
            "description": "billing endpoint returned 403"
        }]
    })
}

/// Seals a request through the CLI and returns the bundle document.
pub fn seal_bundle(
    dir: &Path,
    evidence_id: &str,
    tenant_key: &str,
    config: Option<&Path>,
) -> Value {
    let request_name = format!("{evidence_id}-request.json");
    let request = write_json(dir, &request_name, &seal_request(evidence_id, tenant_key));
    let request_arg = request.to_string_lossy().into_owned();
    let mut args = vec!["seal", request_arg.as_str()];
    let config_arg = config.map(|path| path.to_string_lossy().into_owned());
    if let Some(config_arg) = config_arg.as_deref() {
        args.extend(["--config", config_arg]);
    }
    let output = run_cli(dir, &args);
    assert!(output.status.success(), "seal failed: {}", stderr_text(&output));
    stdout_json(&output)
}

/// Converts a current-schema bundle into its schema-1 form without a
/// ruleset pin, keeping the stored verdict.
pub fn to_legacy_v1(bundle: &Value) -> Value {
    let inputs = &bundle["normalizedInputs"];
    let window_hours = inputs["validityWindowSeconds"].as_u64().expect("window") / 3600;
    let missing: Vec<Value> = bundle["missingData"]
        .as_array()
        .expect("missing data")
        .iter()
        .map(|entry| entry["datasetName"].clone())
        .collect();
    json!({
        "evidenceId": bundle["evidenceId"],
        "schemaVersion": "1",
        "tenantKey": bundle["tenantKey"],
        "cloudId": bundle["cloudId"],
        "createdAt": bundle["createdAtISO"],
        "generatedAt": bundle["generatedAtISO"],
        "snapshotRefs": bundle["snapshotRefs"],
        "driftStatusAtGeneration": bundle["driftStatusAtGeneration"],
        "normalizedInputs": {
            "driftStatus": inputs["driftStatus"],
            "validityWindowHours": window_hours,
            "completenessPercent": inputs["completenessPercent"],
            "missingDatasets": inputs["missingDatasets"]
        },
        "outputTruthMetadata": bundle["outputTruthMetadata"],
        "platformFacts": { "ingestion": "0.9.0" },
        "missingData": missing
    })
}

// crates/truth-evidence-config/tests/common/mod.rs
// ============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for the config crate.
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::io::Write;

use tempfile::NamedTempFile;
use truth_evidence_config::TruthEvidenceConfig;

/// Parses a TOML string into a `TruthEvidenceConfig` without validating it.
pub fn config_from_toml(toml_str: &str) -> Result<TruthEvidenceConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<TruthEvidenceConfig, toml::de::Error> {
    config_from_toml("")
}

/// Writes config bytes to a temporary file that lives as long as the handle.
pub fn write_config(bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

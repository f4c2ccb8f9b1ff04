// crates/truth-evidence-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `truth-evidence.toml`. The example must always pass
//! validation; the config test suite loads it.

/// Returns a canonical example `truth-evidence.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[store]
type = "sqlite"
path = "evidence.db"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"

[audit]
sink = "file"
path = "audit.jsonl"

[rulesets]
current = "1.1.0"

[limits]
max_bundle_bytes = 1048576
"#,
    )
}

// crates/truth-evidence-core/src/runtime/gate.rs
// ============================================================================
// Module: Compatibility Gate
// Description: Fail-closed pre-flight checks run before any regeneration.
// Purpose: Refuse bundles whose pinned ruleset or schema cannot be honored.
// Dependencies: crate::core, crate::runtime::{migration, ruleset}, serde
// ============================================================================

//! ## Overview
//! The gate composes two checks over a raw bundle document:
//! - ruleset existence: the pinned `rulesetVersion` resolves in the registry
//! - schema migratability: `schemaVersion` has a complete migration path
//!
//! Either failure raises [`TruthError::CompatibilityGate`] naming the gate.
//! Callers abort; there is no warn-and-continue path.
//!
//! Bundles written before ruleset tagging carry no `rulesetVersion`. They are
//! pinned to [`LEGACY_RULESET_VERSION`], and this module is the only place
//! that default is applied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::core::error::GateFailure;
use crate::core::error::GateKind;
use crate::core::error::TruthError;
use crate::core::evidence::fields;
use crate::core::identifiers::RulesetVersion;
use crate::core::identifiers::SchemaVersion;
use crate::runtime::migration::MigrationRegistry;
use crate::runtime::migration::document_schema_version;
use crate::runtime::ruleset::RulesetRegistry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Ruleset assumed for bundles that predate ruleset version tagging.
pub const LEGACY_RULESET_VERSION: &str = "1.0.0";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of a passed compatibility gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateClearance {
    /// Ruleset the bundle must be regenerated with.
    pub pinned_ruleset: RulesetVersion,
    /// True when the pin came from [`LEGACY_RULESET_VERSION`].
    pub ruleset_defaulted: bool,
    /// Schema version the bundle was stored with.
    pub schema_version: SchemaVersion,
    /// Versions the bundle passes through during migration.
    pub migration_path: Vec<SchemaVersion>,
}

/// Pre-regeneration gate over the two registries.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityGate<'a> {
    /// Ruleset registry used for the existence check.
    rulesets: &'a RulesetRegistry,
    /// Migration registry used for the migratability check.
    migrations: &'a MigrationRegistry,
}

impl<'a> CompatibilityGate<'a> {
    /// Creates a gate over the provided registries.
    #[must_use]
    pub const fn new(rulesets: &'a RulesetRegistry, migrations: &'a MigrationRegistry) -> Self {
        Self {
            rulesets,
            migrations,
        }
    }

    /// Runs both checks, ruleset existence first.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::CompatibilityGate`] naming the failing gate.
    pub fn check(&self, document: &Value) -> Result<GateClearance, TruthError> {
        let (pinned_ruleset, ruleset_defaulted) = self.check_ruleset(document)?;
        let (schema_version, migration_path) = self.check_schema(document)?;
        Ok(GateClearance {
            pinned_ruleset,
            ruleset_defaulted,
            schema_version,
            migration_path,
        })
    }

    /// Checks that the pinned ruleset resolves.
    ///
    /// Returns the pinned version and whether it was defaulted.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::CompatibilityGate`] for an unresolvable or
    /// malformed pin.
    pub fn check_ruleset(&self, document: &Value) -> Result<(RulesetVersion, bool), TruthError> {
        let (version, defaulted) =
            pinned_ruleset_version(document).map_err(|failure| TruthError::CompatibilityGate {
                gate: GateKind::RulesetExists,
                failure,
            })?;
        match self.rulesets.get(&version) {
            Ok(_) => Ok((version, defaulted)),
            Err(TruthError::Ruleset(err)) => Err(TruthError::CompatibilityGate {
                gate: GateKind::RulesetExists,
                failure: GateFailure::Ruleset(err),
            }),
            Err(other) => Err(other),
        }
    }

    /// Checks that the schema version has a complete migration path.
    ///
    /// Returns the stored version and the path to the target.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::CompatibilityGate`] for a missing, malformed, or
    /// unmigratable schema version.
    pub fn check_schema(
        &self,
        document: &Value,
    ) -> Result<(SchemaVersion, Vec<SchemaVersion>), TruthError> {
        let version = match document_schema_version(document) {
            Ok(version) => version,
            Err(TruthError::Validation(detail)) => {
                return Err(TruthError::CompatibilityGate {
                    gate: GateKind::SchemaMigratable,
                    failure: GateFailure::MalformedSchemaVersion(detail),
                });
            }
            Err(other) => return Err(other),
        };
        match self.migrations.migration_path(&version) {
            Ok(path) => Ok((version, path)),
            Err(TruthError::SchemaMigration(err)) => Err(TruthError::CompatibilityGate {
                gate: GateKind::SchemaMigratable,
                failure: GateFailure::Migration(err),
            }),
            Err(other) => Err(other),
        }
    }
}

/// Reads the pinned ruleset version, applying the legacy default when absent.
///
/// # Errors
///
/// Returns [`GateFailure::MalformedRulesetVersion`] when the field is present
/// but not a non-empty string.
pub fn pinned_ruleset_version(document: &Value) -> Result<(RulesetVersion, bool), GateFailure> {
    match document.get(fields::RULESET_VERSION) {
        None | Some(Value::Null) => Ok((RulesetVersion::new(LEGACY_RULESET_VERSION), true)),
        Some(Value::String(text)) if !text.trim().is_empty() => {
            Ok((RulesetVersion::new(text), false))
        }
        Some(other) => Err(GateFailure::MalformedRulesetVersion(format!(
            "expected non-empty string, got {other}"
        ))),
    }
}

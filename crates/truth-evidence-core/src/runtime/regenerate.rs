// crates/truth-evidence-core/src/runtime/regenerate.rs
// ============================================================================
// Module: Regenerator
// Description: Recomputes a verdict from stored evidence alone.
// Purpose: Prove a stored verdict is reproducible under its pinned ruleset.
// Dependencies: crate::core, crate::runtime::{derive, gate, migration, ruleset}
// ============================================================================

//! ## Overview
//! Regeneration is a pure function of the bundle document. The steps run in
//! a fixed order and any failure aborts the whole operation:
//! 1. validate required fields (`normalizedInputs`, `outputTruthMetadata`,
//!    non-empty `snapshotRefs`)
//! 2. run the compatibility gate
//! 3. migrate the document to the current schema
//! 4. resolve the pinned ruleset, never the current one
//! 5. derive inputs and evaluate
//!
//! No network, no storage, and no wall clock are touched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::error::TruthError;
use crate::core::evidence::EvidenceBundle;
use crate::core::evidence::fields;
use crate::core::truth::OutputTruthMetadata;
use crate::runtime::derive::derive_from_bundle;
use crate::runtime::gate::CompatibilityGate;
use crate::runtime::gate::GateClearance;
use crate::runtime::migration::MigrationRegistry;
use crate::runtime::ruleset::RulesetRegistry;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Full result of replaying a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regeneration {
    /// Gate outcome, including the pinned ruleset.
    pub clearance: GateClearance,
    /// Bundle migrated to the current schema.
    pub bundle: EvidenceBundle,
    /// Freshly computed verdict.
    pub verdict: OutputTruthMetadata,
}

/// Gated, migrating regenerator.
#[derive(Debug, Clone, Copy)]
pub struct Regenerator<'a> {
    /// Ruleset registry used to resolve pinned versions.
    rulesets: &'a RulesetRegistry,
    /// Migration registry used to upgrade historical documents.
    migrations: &'a MigrationRegistry,
}

impl<'a> Regenerator<'a> {
    /// Creates a regenerator over the provided registries.
    #[must_use]
    pub const fn new(rulesets: &'a RulesetRegistry, migrations: &'a MigrationRegistry) -> Self {
        Self {
            rulesets,
            migrations,
        }
    }

    /// Regenerates the verdict for a typed bundle.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError`] when any regeneration step fails.
    pub fn regenerate(&self, bundle: &EvidenceBundle) -> Result<OutputTruthMetadata, TruthError> {
        let document = bundle.to_document()?;
        self.regenerate_document(&document)
    }

    /// Regenerates the verdict for a stored bundle document.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError`] when any regeneration step fails.
    pub fn regenerate_document(&self, document: &Value) -> Result<OutputTruthMetadata, TruthError> {
        self.replay(document).map(|regeneration| regeneration.verdict)
    }

    /// Replays a stored bundle document and returns every intermediate result.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError`] when any regeneration step fails.
    pub fn replay(&self, document: &Value) -> Result<Regeneration, TruthError> {
        validate_required_fields(document)?;
        let clearance = CompatibilityGate::new(self.rulesets, self.migrations).check(document)?;
        let bundle = load_migrated(self.migrations, document)?;
        let definition = self.rulesets.get(&clearance.pinned_ruleset)?;
        let inputs = derive_from_bundle(&bundle)?;
        let verdict = definition.compute_truth(&inputs)?;
        Ok(Regeneration {
            clearance,
            bundle,
            verdict,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Checks the structurally required fields of a bundle document.
///
/// # Errors
///
/// Returns [`TruthError::Validation`] naming the first missing field.
pub fn validate_required_fields(document: &Value) -> Result<(), TruthError> {
    let Value::Object(object) = document else {
        return Err(TruthError::Validation("bundle document is not an object".to_string()));
    };
    for field in [fields::NORMALIZED_INPUTS, fields::OUTPUT_TRUTH_METADATA] {
        match object.get(field) {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(TruthError::Validation(format!("{field} must be an object")));
            }
            None => return Err(TruthError::Validation(format!("bundle missing {field}"))),
        }
    }
    match object.get(fields::SNAPSHOT_REFS) {
        Some(Value::Array(refs)) if !refs.is_empty() => Ok(()),
        Some(Value::Array(_)) => {
            Err(TruthError::Validation(format!("{} must not be empty", fields::SNAPSHOT_REFS)))
        }
        Some(_) => {
            Err(TruthError::Validation(format!("{} must be an array", fields::SNAPSHOT_REFS)))
        }
        None => Err(TruthError::Validation(format!("bundle missing {}", fields::SNAPSHOT_REFS))),
    }
}

/// Migrates a document and decodes it as a current-schema bundle.
///
/// The embedded `bundleHash` is left undecoded (`bundle_hash` is `None`):
/// its integrity is judged against the raw document, so a forged or
/// malformed digest never masquerades as a shape error.
///
/// # Errors
///
/// Returns [`TruthError`] when migration fails or the migrated document does
/// not match the current bundle shape.
pub fn load_migrated(
    migrations: &MigrationRegistry,
    document: &Value,
) -> Result<EvidenceBundle, TruthError> {
    let mut migrated = migrations.apply(document)?;
    if let Value::Object(object) = &mut migrated {
        object.remove(fields::BUNDLE_HASH);
    }
    serde_json::from_value(migrated)
        .map_err(|err| TruthError::Validation(format!("malformed evidence bundle: {err}")))
}

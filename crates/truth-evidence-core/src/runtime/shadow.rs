// crates/truth-evidence-core/src/runtime/shadow.rs
// ============================================================================
// Module: Shadow Evaluator
// Description: Diagnostic re-evaluation of stored evidence under current rules.
// Purpose: Preview verdict changes without touching stored records.
// Dependencies: crate::core, crate::runtime::{derive, gate, regenerate, ruleset, verify}
// ============================================================================

//! ## Overview
//! Shadow evaluation runs the registry's current ruleset against a stored
//! bundle's inputs and diffs the result with the stored verdict. It is
//! advisory only: it never writes, never affects verification, and is scoped
//! to one tenant. The caller's tenant key must equal the bundle's, so diffs
//! for one tenant can never be produced from another tenant's evidence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::TruthError;
use crate::core::evidence::EvidenceBundle;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::RulesetVersion;
use crate::core::identifiers::TenantKey;
use crate::core::time::Timestamp;
use crate::core::truth::OutputTruthMetadata;
use crate::runtime::derive::derive_from_bundle;
use crate::runtime::gate::CompatibilityGate;
use crate::runtime::gate::pinned_ruleset_version;
use crate::runtime::migration::MigrationRegistry;
use crate::runtime::regenerate::load_migrated;
use crate::runtime::regenerate::validate_required_fields;
use crate::runtime::ruleset::RulesetRegistry;
use crate::runtime::verify::FieldDifference;
use crate::runtime::verify::compare_verdicts;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Shadow comparison outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShadowStatus {
    /// Current rules reproduce the stored verdict.
    Identical,
    /// Current rules would produce a different verdict.
    Differs,
}

/// Ephemeral shadow evaluation result; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowEvaluationResult {
    /// Tenant the evaluation was scoped to.
    pub tenant_key: TenantKey,
    /// Evaluated bundle.
    pub evidence_id: EvidenceId,
    /// Caller-supplied evaluation instant.
    pub evaluated_at: Timestamp,
    /// Ruleset pinned in the bundle.
    pub pinned_ruleset_version: RulesetVersion,
    /// Current ruleset used for the shadow verdict.
    pub shadow_ruleset_version: RulesetVersion,
    /// Comparison outcome.
    pub status: ShadowStatus,
    /// True when any field differs.
    pub has_differences: bool,
    /// Per-field differences against the stored verdict.
    pub differences: Vec<FieldDifference>,
    /// Verdict under the current ruleset.
    pub shadow_verdict: OutputTruthMetadata,
}

/// Evaluates stored bundles under the current ruleset.
#[derive(Debug, Clone, Copy)]
pub struct ShadowEvaluator<'a> {
    /// Ruleset registry; only the current version is used.
    rulesets: &'a RulesetRegistry,
    /// Migration registry.
    migrations: &'a MigrationRegistry,
}

impl<'a> ShadowEvaluator<'a> {
    /// Creates a shadow evaluator over the provided registries.
    #[must_use]
    pub const fn new(rulesets: &'a RulesetRegistry, migrations: &'a MigrationRegistry) -> Self {
        Self {
            rulesets,
            migrations,
        }
    }

    /// Evaluates a typed bundle for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError`] when the tenant does not own the bundle or
    /// evaluation fails.
    pub fn evaluate_shadow(
        &self,
        tenant_key: &TenantKey,
        bundle: &EvidenceBundle,
        evaluated_at: Timestamp,
    ) -> Result<ShadowEvaluationResult, TruthError> {
        let document = bundle.to_document()?;
        self.evaluate_shadow_document(tenant_key, &document, evaluated_at)
    }

    /// Evaluates a stored bundle document for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::Validation`] when the tenant does not own the
    /// bundle, [`TruthError::CompatibilityGate`] when the schema cannot be
    /// migrated, and any evaluation error.
    pub fn evaluate_shadow_document(
        &self,
        tenant_key: &TenantKey,
        document: &Value,
        evaluated_at: Timestamp,
    ) -> Result<ShadowEvaluationResult, TruthError> {
        validate_required_fields(document)?;
        CompatibilityGate::new(self.rulesets, self.migrations).check_schema(document)?;
        let (pinned_ruleset_version, _) = pinned_ruleset_version(document).map_err(|failure| {
            TruthError::Validation(format!("unusable pinned ruleset: {failure}"))
        })?;
        let bundle = load_migrated(self.migrations, document)?;
        if bundle.tenant_key != *tenant_key {
            return Err(TruthError::Validation(format!(
                "bundle {} is not owned by tenant {tenant_key}",
                bundle.evidence_id
            )));
        }
        let shadow_ruleset_version = self.rulesets.current_version()?;
        let definition = self.rulesets.get(&shadow_ruleset_version)?;
        let inputs = derive_from_bundle(&bundle)?;
        let shadow_verdict = definition.compute_truth(&inputs)?;
        let differences = compare_verdicts(&bundle.output_truth_metadata, &shadow_verdict);
        let has_differences = !differences.is_empty();
        let status = if has_differences { ShadowStatus::Differs } else { ShadowStatus::Identical };
        Ok(ShadowEvaluationResult {
            tenant_key: bundle.tenant_key,
            evidence_id: bundle.evidence_id,
            evaluated_at,
            pinned_ruleset_version,
            shadow_ruleset_version,
            status,
            has_differences,
            differences,
            shadow_verdict,
        })
    }
}

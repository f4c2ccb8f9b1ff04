// crates/truth-evidence-core/src/runtime/seal.rs
// ============================================================================
// Module: Evidence Sealer
// Description: Creation path that evaluates facts and seals the bundle.
// Purpose: Produce hashed evidence pinned to the current ruleset version.
// Dependencies: crate::core, crate::runtime::{derive, ruleset}, serde
// ============================================================================

//! ## Overview
//! Sealing is the one place besides shadow evaluation that resolves the
//! registry's current ruleset. The resolved version is copied into the
//! bundle and never updated afterwards. Inputs are derived with the same
//! function regeneration uses, so a sealed bundle always verifies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::TruthError;
use crate::core::evidence::CURRENT_SCHEMA_VERSION;
use crate::core::evidence::DriftStatusAtGeneration;
use crate::core::evidence::EnvironmentFacts;
use crate::core::evidence::EvidenceBundle;
use crate::core::evidence::MissingDataEntry;
use crate::core::evidence::NormalizedInputs;
use crate::core::evidence::SnapshotRef;
use crate::core::identifiers::CloudId;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::SchemaVersion;
use crate::core::identifiers::TenantKey;
use crate::core::time::Timestamp;
use crate::core::truth::DriftStatus;
use crate::runtime::derive::derive_truth_inputs;
use crate::runtime::ruleset::RulesetRegistry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment fact recording the engine version that sealed a bundle.
pub const ENGINE_VERSION_FACT: &str = "truthEvidenceEngine";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Normalized facts handed over by the report generation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealRequest {
    /// Identifier assigned to the new bundle.
    pub evidence_id: EvidenceId,
    /// Tenant key.
    pub tenant_key: TenantKey,
    /// Source-system site identifier.
    pub cloud_id: CloudId,
    /// Record creation instant.
    pub created_at: Timestamp,
    /// Verdict generation instant.
    pub generated_at: Timestamp,
    /// Snapshot references, evaluated snapshot first.
    pub snapshot_refs: Vec<SnapshotRef>,
    /// Drift summary observed by ingestion.
    pub drift_status_at_generation: DriftStatusAtGeneration,
    /// Drift status fed to the evaluator.
    pub drift_status: DriftStatus,
    /// Validity window in seconds.
    pub validity_window_seconds: u64,
    /// Datasets that could not be read.
    #[serde(default)]
    pub missing_data: Vec<MissingDataEntry>,
    /// Collaborating subsystem versions.
    #[serde(default)]
    pub environment_facts: EnvironmentFacts,
}

/// Seals new evidence under the registry's current ruleset.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceSealer<'a> {
    /// Ruleset registry.
    rulesets: &'a RulesetRegistry,
}

impl<'a> EvidenceSealer<'a> {
    /// Creates a sealer over a ruleset registry.
    #[must_use]
    pub const fn new(rulesets: &'a RulesetRegistry) -> Self {
        Self {
            rulesets,
        }
    }

    /// Evaluates the request and returns the sealed bundle.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::Validation`] for blank identifiers or empty
    /// snapshot references, and any evaluation or hashing error.
    pub fn seal(&self, request: SealRequest) -> Result<EvidenceBundle, TruthError> {
        if request.evidence_id.is_blank() {
            return Err(TruthError::Validation("evidenceId must not be blank".to_string()));
        }
        if request.tenant_key.is_blank() {
            return Err(TruthError::Validation("tenantKey must not be blank".to_string()));
        }
        let version = self.rulesets.current_version()?;
        let definition = self.rulesets.get(&version)?;

        let mut missing_data = request.missing_data;
        missing_data.sort();
        missing_data.dedup();
        let mut normalized_inputs = NormalizedInputs {
            drift_status: request.drift_status,
            validity_window_seconds: request.validity_window_seconds,
            completeness_percent: 0,
            missing_datasets: BTreeSet::new(),
        };
        let inputs = derive_truth_inputs(
            request.generated_at,
            &request.snapshot_refs,
            &normalized_inputs,
            &missing_data,
        )?;
        normalized_inputs.completeness_percent = inputs.completeness_percent;
        normalized_inputs.missing_datasets = inputs.missing_data.clone();
        let verdict = definition.compute_truth(&inputs)?;

        let mut environment_facts = request.environment_facts;
        environment_facts.insert(ENGINE_VERSION_FACT, env!("CARGO_PKG_VERSION"));

        let bundle = EvidenceBundle {
            evidence_id: request.evidence_id,
            schema_version: SchemaVersion::new(CURRENT_SCHEMA_VERSION),
            tenant_key: request.tenant_key,
            cloud_id: request.cloud_id,
            created_at: request.created_at,
            generated_at: request.generated_at,
            ruleset_version: Some(version),
            snapshot_refs: request.snapshot_refs,
            drift_status_at_generation: request.drift_status_at_generation,
            normalized_inputs,
            output_truth_metadata: verdict,
            environment_facts,
            missing_data,
            bundle_hash: None,
        };
        Ok(bundle.sealed()?)
    }
}

// crates/truth-evidence-core/src/core/evidence.rs
// ============================================================================
// Module: Evidence Bundle Schema
// Description: Sealed evidence record binding a verdict to its exact inputs.
// Purpose: Provide the persisted, hashed shape replayed during regeneration.
// Dependencies: crate::core::{hashing, identifiers, time, truth}, serde
// ============================================================================

//! ## Overview
//! An [`EvidenceBundle`] is created once, at report generation time, and is
//! append-only afterwards. It pins the ruleset version that produced its
//! verdict and records everything needed to reproduce that verdict offline.
//!
//! The bundle digest covers the canonical bundle with the `bundleHash` field
//! removed, so any single-field change to a stored record is detectable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::hashing::hash_canonical_json_excluding;
use crate::core::identifiers::CloudId;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::RulesetVersion;
use crate::core::identifiers::SchemaVersion;
use crate::core::identifiers::SnapshotId;
use crate::core::identifiers::TenantKey;
use crate::core::time::Timestamp;
use crate::core::truth::DriftStatus;
use crate::core::truth::OutputTruthMetadata;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Schema version written by the current sealer.
pub const CURRENT_SCHEMA_VERSION: &str = "3";

/// Persisted field names shared by gates, migrations, and validation.
pub mod fields {
    /// Bundle identifier field.
    pub const EVIDENCE_ID: &str = "evidenceId";
    /// Schema version field.
    pub const SCHEMA_VERSION: &str = "schemaVersion";
    /// Tenant key field.
    pub const TENANT_KEY: &str = "tenantKey";
    /// Pinned ruleset version field.
    pub const RULESET_VERSION: &str = "rulesetVersion";
    /// Snapshot reference list field.
    pub const SNAPSHOT_REFS: &str = "snapshotRefs";
    /// Normalized evaluator inputs field.
    pub const NORMALIZED_INPUTS: &str = "normalizedInputs";
    /// Stored verdict field.
    pub const OUTPUT_TRUTH_METADATA: &str = "outputTruthMetadata";
    /// Missing dataset list field.
    pub const MISSING_DATA: &str = "missingData";
    /// Environment facts field.
    pub const ENVIRONMENT_FACTS: &str = "environmentFacts";
    /// Embedded bundle digest field.
    pub const BUNDLE_HASH: &str = "bundleHash";
}

// ============================================================================
// SECTION: Bundle Components
// ============================================================================

/// Reference to a metadata snapshot read from the system of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRef {
    /// Snapshot identifier.
    pub snapshot_id: SnapshotId,
    /// Digest of the snapshot payload as captured.
    pub snapshot_hash: String,
    /// Capture instant.
    pub captured_at: Timestamp,
    /// Snapshot type label (for example `full` or `incremental`).
    #[serde(rename = "type")]
    pub kind: String,
}

/// Drift summary recorded at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftStatusAtGeneration {
    /// Number of drift findings observed.
    pub drift_detected_count: u32,
    /// Human-readable drift summary.
    pub drift_status_summary: String,
}

/// Normalized facts recorded alongside the verdict.
///
/// # Invariants
/// - `completeness_percent` is informational; regeneration recomputes
///   completeness from the bundle's `missing_data` list instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedInputs {
    /// Drift status fed to the evaluator.
    pub drift_status: DriftStatus,
    /// Validity window in seconds.
    pub validity_window_seconds: u64,
    /// Completeness in percent as computed at generation time.
    pub completeness_percent: u8,
    /// Names of missing datasets at generation time.
    pub missing_datasets: BTreeSet<String>,
}

/// Dataset the ingestion path could not read.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingDataEntry {
    /// Dataset name.
    pub dataset_name: String,
    /// Machine reason code.
    pub reason_code: String,
    /// Human-readable description.
    pub description: String,
}

/// Versions of collaborating subsystems at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentFacts(pub BTreeMap<String, String>);

impl EnvironmentFacts {
    /// Creates an empty fact set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Records a fact, replacing any previous value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns the value recorded for a fact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

// ============================================================================
// SECTION: Evidence Bundle
// ============================================================================

/// Sealed evidence record for one generated report.
///
/// # Invariants
/// - `ruleset_version` is copied from the ruleset active at creation and is
///   never updated; it is absent only on bundles that predate version tagging.
/// - `snapshot_refs` is non-empty; the first entry is the evaluated snapshot.
/// - `bundle_hash`, when present, covers every other field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceBundle {
    /// Unique bundle identifier.
    pub evidence_id: EvidenceId,
    /// Schema version of this record.
    pub schema_version: SchemaVersion,
    /// Tenant key.
    pub tenant_key: TenantKey,
    /// Source-system site identifier.
    pub cloud_id: CloudId,
    /// Instant the record was created.
    #[serde(rename = "createdAtISO")]
    pub created_at: Timestamp,
    /// Instant the verdict was generated.
    #[serde(rename = "generatedAtISO")]
    pub generated_at: Timestamp,
    /// Pinned ruleset version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruleset_version: Option<RulesetVersion>,
    /// Snapshot references, evaluated snapshot first.
    pub snapshot_refs: Vec<SnapshotRef>,
    /// Drift summary at generation time.
    pub drift_status_at_generation: DriftStatusAtGeneration,
    /// Facts fed to the evaluator.
    pub normalized_inputs: NormalizedInputs,
    /// Verdict produced at creation time.
    pub output_truth_metadata: OutputTruthMetadata,
    /// Collaborating subsystem versions.
    pub environment_facts: EnvironmentFacts,
    /// Datasets that could not be read.
    pub missing_data: Vec<MissingDataEntry>,
    /// Digest over all other fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_hash: Option<HashDigest>,
}

impl EvidenceBundle {
    /// Computes the bundle digest over every field except `bundle_hash`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn compute_hash(&self) -> Result<HashDigest, HashError> {
        let unsealed = Self {
            bundle_hash: None,
            ..self.clone()
        };
        hash_canonical_json(DEFAULT_HASH_ALGORITHM, &unsealed)
    }

    /// Returns a copy with `bundle_hash` set to the freshly computed digest.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn sealed(mut self) -> Result<Self, HashError> {
        self.bundle_hash = Some(self.compute_hash()?);
        Ok(self)
    }

    /// Converts the bundle into its persisted JSON document form.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Canonicalization`] when serialization fails.
    pub fn to_document(&self) -> Result<Value, HashError> {
        serde_json::to_value(self).map_err(|err| HashError::Canonicalization(err.to_string()))
    }
}

/// Computes the digest of a persisted bundle document, excluding `bundleHash`.
///
/// Works for every schema version because it never re-types the document.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails.
pub fn hash_evidence_document(document: &Value) -> Result<HashDigest, HashError> {
    hash_canonical_json_excluding(DEFAULT_HASH_ALGORITHM, document, fields::BUNDLE_HASH)
}

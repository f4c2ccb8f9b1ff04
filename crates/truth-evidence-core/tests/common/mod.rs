// crates/truth-evidence-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared fixtures for truth evidence core tests.
// Purpose: Provide deterministic inputs, requests, and historical documents.
// Dependencies: truth-evidence-core, serde_json
// ============================================================================

//! ## Overview
//! Fixtures use fixed RFC 3339 instants so every verdict in the suite is
//! reproducible. The legacy document mirrors a schema-1 record written
//! before ruleset version tagging.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_json::Value;
use serde_json::json;
use truth_evidence_core::CloudId;
use truth_evidence_core::DriftStatus;
use truth_evidence_core::DriftStatusAtGeneration;
use truth_evidence_core::EnvironmentFacts;
use truth_evidence_core::EvidenceBundle;
use truth_evidence_core::EvidenceId;
use truth_evidence_core::MigrationRegistry;
use truth_evidence_core::MissingDataEntry;
use truth_evidence_core::RulesetRegistry;
use truth_evidence_core::RulesetVersion;
use truth_evidence_core::SealRequest;
use truth_evidence_core::SnapshotId;
use truth_evidence_core::SnapshotRef;
use truth_evidence_core::TenantKey;
use truth_evidence_core::Timestamp;
use truth_evidence_core::TruthInputs;
use truth_evidence_core::runtime::EvidenceSealer;
use truth_evidence_core::runtime::completeness_from_missing;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Verdict generation instant.
pub const GENERATED_AT: &str = "2025-03-01T12:00:00Z";

/// Snapshot capture instant (six hours before generation).
pub const CAPTURED_AT: &str = "2025-03-01T06:00:00Z";

/// Record creation instant.
pub const CREATED_AT: &str = "2025-03-01T12:00:05Z";

/// One day in seconds.
pub const DAY_SECONDS: u64 = 86_400;

/// Snapshot digest used by fixtures.
pub const SNAPSHOT_HASH: &str = "ab12ab12ab12ab12ab12ab12ab12ab12ab12ab12ab12ab12ab12ab12ab12ab12";

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Parses a fixture timestamp.
pub fn ts(text: &str) -> Timestamp {
    Timestamp::parse_rfc3339(text).unwrap()
}

/// Returns the fixture snapshot reference.
pub fn snapshot_ref() -> SnapshotRef {
    SnapshotRef {
        snapshot_id: SnapshotId::new("snap-001"),
        snapshot_hash: SNAPSHOT_HASH.to_string(),
        captured_at: ts(CAPTURED_AT),
        kind: "full".to_string(),
    }
}

/// Builds fresh evaluator inputs with no missing datasets.
pub fn inputs(completeness_percent: u8, drift_status: DriftStatus) -> TruthInputs {
    TruthInputs {
        generated_at: ts(GENERATED_AT),
        snapshot_id: SnapshotId::new("snap-001"),
        snapshot_captured_at: ts(CAPTURED_AT),
        completeness_percent,
        drift_status,
        missing_data: BTreeSet::new(),
        validity_window_seconds: DAY_SECONDS,
    }
}

/// Builds missing data entries for dataset names.
pub fn missing(names: &[&str]) -> Vec<MissingDataEntry> {
    names
        .iter()
        .map(|name| MissingDataEntry {
            dataset_name: (*name).to_string(),
            reason_code: "API_FORBIDDEN".to_string(),
            description: format!("{name} endpoint returned 403"),
        })
        .collect()
}

/// Builds a seal request.
pub fn seal_request(
    evidence_id: &str,
    tenant_key: &str,
    drift_status: DriftStatus,
    missing_names: &[&str],
) -> SealRequest {
    SealRequest {
        evidence_id: EvidenceId::new(evidence_id),
        tenant_key: TenantKey::new(tenant_key),
        cloud_id: CloudId::new("cloud-001"),
        created_at: ts(CREATED_AT),
        generated_at: ts(GENERATED_AT),
        snapshot_refs: vec![snapshot_ref()],
        drift_status_at_generation: DriftStatusAtGeneration {
            drift_detected_count: 0,
            drift_status_summary: "no drift observed".to_string(),
        },
        drift_status,
        validity_window_seconds: DAY_SECONDS,
        missing_data: missing(missing_names),
        environment_facts: EnvironmentFacts::new(),
    }
}

/// Returns the built-in registries.
pub fn builtin_registries() -> (RulesetRegistry, MigrationRegistry) {
    (RulesetRegistry::builtin().unwrap(), MigrationRegistry::builtin().unwrap())
}

/// Seals a bundle under the current ruleset of `rulesets`.
pub fn sealed_bundle(
    rulesets: &RulesetRegistry,
    evidence_id: &str,
    tenant_key: &str,
    drift_status: DriftStatus,
    missing_names: &[&str],
) -> EvidenceBundle {
    EvidenceSealer::new(rulesets)
        .seal(seal_request(evidence_id, tenant_key, drift_status, missing_names))
        .unwrap()
}

/// Builds a schema-1 document without `rulesetVersion` whose stored verdict
/// was produced by ruleset 1.0.0.
pub fn legacy_v1_document(evidence_id: &str, tenant_key: &str, missing_names: &[&str]) -> Value {
    let rulesets = RulesetRegistry::builtin().unwrap();
    let names: BTreeSet<String> = missing_names.iter().map(|name| (*name).to_string()).collect();
    let completeness = completeness_from_missing(&names);
    let inputs = TruthInputs {
        missing_data: names.clone(),
        ..inputs(completeness, DriftStatus::NoDrift)
    };
    let verdict =
        rulesets.get(&RulesetVersion::new("1.0.0")).unwrap().compute_truth(&inputs).unwrap();
    json!({
        "evidenceId": evidence_id,
        "schemaVersion": "1",
        "tenantKey": tenant_key,
        "cloudId": "cloud-legacy",
        "createdAt": CREATED_AT,
        "generatedAt": GENERATED_AT,
        "snapshotRefs": [{
            "snapshotId": "snap-001",
            "snapshotHash": SNAPSHOT_HASH,
            "capturedAt": CAPTURED_AT,
            "type": "full"
        }],
        "driftStatusAtGeneration": {
            "driftDetectedCount": 0,
            "driftStatusSummary": "no drift observed"
        },
        "normalizedInputs": {
            "driftStatus": "NO_DRIFT",
            "validityWindowHours": 24,
            "completenessPercent": completeness,
            "missingDatasets": names
        },
        "outputTruthMetadata": serde_json::to_value(&verdict).unwrap(),
        "platformFacts": { "ingestion": "0.9.0" },
        "missingData": names
    })
}

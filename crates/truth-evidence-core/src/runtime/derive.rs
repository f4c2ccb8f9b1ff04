// crates/truth-evidence-core/src/runtime/derive.rs
// ============================================================================
// Module: Evaluator Input Derivation
// Description: Deterministic mapping from bundle contents to evaluator inputs.
// Purpose: Share one derivation between sealing and regeneration.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Sealing and regeneration both derive [`TruthInputs`] here, so a freshly
//! sealed bundle always regenerates to its stored verdict. The derivation
//! reads only the values it is given:
//! - the evaluation instant is the bundle's `generatedAt`, never the clock
//! - capture time and snapshot id come from the first snapshot reference
//! - completeness is recomputed from the missing dataset names, so a
//!   tampered stored `completenessPercent` cannot survive verification

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::error::TruthError;
use crate::core::evidence::EvidenceBundle;
use crate::core::evidence::MissingDataEntry;
use crate::core::evidence::NormalizedInputs;
use crate::core::evidence::SnapshotRef;
use crate::core::time::Timestamp;
use crate::core::truth::TruthInputs;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Completeness points deducted per distinct missing dataset.
pub const COMPLETENESS_PENALTY_PER_MISSING_DATASET: u8 = 10;

/// Completeness with no datasets missing.
const FULL_COMPLETENESS: usize = 100;

// ============================================================================
// SECTION: Derivation
// ============================================================================

/// Computes completeness from distinct missing dataset names, clamped to 0-100.
#[must_use]
pub fn completeness_from_missing(missing: &BTreeSet<String>) -> u8 {
    let penalty =
        missing.len().saturating_mul(usize::from(COMPLETENESS_PENALTY_PER_MISSING_DATASET));
    u8::try_from(FULL_COMPLETENESS.saturating_sub(penalty)).unwrap_or(0)
}

/// Collects the sorted, distinct dataset names of missing data entries.
///
/// # Errors
///
/// Returns [`TruthError::Validation`] when a dataset name is blank.
pub fn missing_dataset_names(entries: &[MissingDataEntry]) -> Result<BTreeSet<String>, TruthError> {
    let mut names = BTreeSet::new();
    for entry in entries {
        if entry.dataset_name.trim().is_empty() {
            return Err(TruthError::Validation(
                "missingData entry has a blank datasetName".to_string(),
            ));
        }
        names.insert(entry.dataset_name.clone());
    }
    Ok(names)
}

/// Derives evaluator inputs from bundle components.
///
/// # Errors
///
/// Returns [`TruthError::Validation`] when `snapshot_refs` is empty or a
/// missing dataset name is blank.
pub fn derive_truth_inputs(
    generated_at: Timestamp,
    snapshot_refs: &[SnapshotRef],
    normalized: &NormalizedInputs,
    missing: &[MissingDataEntry],
) -> Result<TruthInputs, TruthError> {
    let Some(snapshot) = snapshot_refs.first() else {
        return Err(TruthError::Validation("snapshotRefs must not be empty".to_string()));
    };
    let missing_data = missing_dataset_names(missing)?;
    Ok(TruthInputs {
        generated_at,
        snapshot_id: snapshot.snapshot_id.clone(),
        snapshot_captured_at: snapshot.captured_at,
        completeness_percent: completeness_from_missing(&missing_data),
        drift_status: normalized.drift_status,
        missing_data,
        validity_window_seconds: normalized.validity_window_seconds,
    })
}

/// Derives evaluator inputs from a typed bundle.
///
/// # Errors
///
/// Returns [`TruthError::Validation`] when the bundle is structurally incomplete.
pub fn derive_from_bundle(bundle: &EvidenceBundle) -> Result<TruthInputs, TruthError> {
    derive_truth_inputs(
        bundle.generated_at,
        &bundle.snapshot_refs,
        &bundle.normalized_inputs,
        &bundle.missing_data,
    )
}

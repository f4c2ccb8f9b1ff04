// crates/truth-evidence-core/src/runtime/verify.rs
// ============================================================================
// Module: Evidence Verifier
// Description: Compares regenerated verdicts against stored verdicts.
// Purpose: Surface irreproducible or tampered evidence as named differences.
// Dependencies: crate::core, crate::runtime::regenerate, serde, serde_json
// ============================================================================

//! ## Overview
//! The verifier regenerates a bundle and compares the fresh verdict with the
//! stored one on `completenessPercent`, `confidenceLevel`, `validityStatus`,
//! and the order-independent `reasons` and `warnings` sets. When the stored
//! document carries a `bundleHash`, the digest is recomputed over the raw
//! document as well. Any difference fails the report; the report is always
//! returned to the caller rather than swallowed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::TruthError;
use crate::core::evidence::EvidenceBundle;
use crate::core::evidence::fields;
use crate::core::evidence::hash_evidence_document;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::RulesetVersion;
use crate::core::truth::OutputTruthMetadata;
use crate::runtime::regenerate::Regenerator;

// ============================================================================
// SECTION: Verification Types
// ============================================================================

/// Verification status for evidence reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Verification succeeded.
    Pass,
    /// Verification failed.
    Fail,
}

/// Verdict fields compared during verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerdictField {
    /// Completeness percentage.
    CompletenessPercent,
    /// Confidence level.
    ConfidenceLevel,
    /// Validity status.
    ValidityStatus,
    /// Reason set.
    Reasons,
    /// Warning set.
    Warnings,
    /// Embedded bundle digest.
    BundleHash,
}

/// One field whose stored and regenerated values differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDifference {
    /// Field that differs.
    pub field: VerdictField,
    /// Stored value.
    pub stored: Value,
    /// Regenerated value.
    pub regenerated: Value,
}

/// Offline verification report for one evidence bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// Verified bundle.
    pub evidence_id: EvidenceId,
    /// Ruleset the verdict was regenerated with.
    pub pinned_ruleset_version: RulesetVersion,
    /// Verification status.
    pub status: VerificationStatus,
    /// True when no differences were found.
    pub matches: bool,
    /// Differences, if any.
    pub differences: Vec<FieldDifference>,
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Regenerates and compares stored evidence.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'a> {
    /// Regenerator used for the fresh verdict.
    regenerator: Regenerator<'a>,
}

impl<'a> Verifier<'a> {
    /// Creates a verifier around a regenerator.
    #[must_use]
    pub const fn new(regenerator: Regenerator<'a>) -> Self {
        Self {
            regenerator,
        }
    }

    /// Verifies a typed bundle.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError`] when regeneration fails.
    pub fn verify(&self, bundle: &EvidenceBundle) -> Result<VerificationReport, TruthError> {
        let document = bundle.to_document()?;
        self.verify_document(&document)
    }

    /// Verifies a stored bundle document.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError`] when regeneration fails.
    pub fn verify_document(&self, document: &Value) -> Result<VerificationReport, TruthError> {
        let regeneration = self.regenerator.replay(document)?;
        let mut differences =
            compare_verdicts(&regeneration.bundle.output_truth_metadata, &regeneration.verdict);
        if let Some(difference) = bundle_hash_difference(document)? {
            differences.push(difference);
        }
        let matches = differences.is_empty();
        let status = if matches { VerificationStatus::Pass } else { VerificationStatus::Fail };
        Ok(VerificationReport {
            evidence_id: regeneration.bundle.evidence_id,
            pinned_ruleset_version: regeneration.clearance.pinned_ruleset,
            status,
            matches,
            differences,
        })
    }
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Compares the verified fields of two verdicts.
///
/// `reasons` and `warnings` are compared as sets.
#[must_use]
pub fn compare_verdicts(
    stored: &OutputTruthMetadata,
    regenerated: &OutputTruthMetadata,
) -> Vec<FieldDifference> {
    let mut differences = Vec::new();
    if stored.completeness_percent != regenerated.completeness_percent {
        differences.push(FieldDifference {
            field: VerdictField::CompletenessPercent,
            stored: Value::from(stored.completeness_percent),
            regenerated: Value::from(regenerated.completeness_percent),
        });
    }
    if stored.confidence_level != regenerated.confidence_level {
        differences.push(FieldDifference {
            field: VerdictField::ConfidenceLevel,
            stored: Value::from(stored.confidence_level.as_str()),
            regenerated: Value::from(regenerated.confidence_level.as_str()),
        });
    }
    if stored.validity_status != regenerated.validity_status {
        differences.push(FieldDifference {
            field: VerdictField::ValidityStatus,
            stored: Value::from(stored.validity_status.as_str()),
            regenerated: Value::from(regenerated.validity_status.as_str()),
        });
    }
    let stored_reasons = as_set(&stored.reasons);
    let regenerated_reasons = as_set(&regenerated.reasons);
    if stored_reasons != regenerated_reasons {
        differences.push(FieldDifference {
            field: VerdictField::Reasons,
            stored: set_value(&stored_reasons),
            regenerated: set_value(&regenerated_reasons),
        });
    }
    let stored_warnings = as_set(&stored.warnings);
    let regenerated_warnings = as_set(&regenerated.warnings);
    if stored_warnings != regenerated_warnings {
        differences.push(FieldDifference {
            field: VerdictField::Warnings,
            stored: set_value(&stored_warnings),
            regenerated: set_value(&regenerated_warnings),
        });
    }
    differences
}

/// Recomputes the digest of a document that embeds `bundleHash`.
fn bundle_hash_difference(document: &Value) -> Result<Option<FieldDifference>, TruthError> {
    let Some(stored) = document.get(fields::BUNDLE_HASH) else {
        return Ok(None);
    };
    let computed = hash_evidence_document(document)?;
    let stored_digest = serde_json::from_value::<HashDigest>(stored.clone()).ok();
    if stored_digest.is_some_and(|digest| digest.is_well_formed() && digest == computed) {
        return Ok(None);
    }
    let regenerated = serde_json::to_value(&computed)
        .map_err(|err| HashError::Canonicalization(err.to_string()))?;
    Ok(Some(FieldDifference {
        field: VerdictField::BundleHash,
        stored: stored.clone(),
        regenerated,
    }))
}

/// Collects list entries into an ordered set.
fn as_set(items: &[String]) -> BTreeSet<&str> {
    items.iter().map(String::as_str).collect()
}

/// Renders an ordered set as a JSON array.
fn set_value(items: &BTreeSet<&str>) -> Value {
    Value::Array(items.iter().map(|item| Value::from(*item)).collect())
}

// crates/truth-evidence-core/src/runtime/rules.rs
// ============================================================================
// Module: Truth Rule Evaluator
// Description: Ordered validity and confidence rules for built-in rulesets.
// Purpose: Turn observability facts into a verdict under strict invariants.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Every built-in ruleset applies the same five rules in a fixed order. The
//! first rule that matches decides validity and confidence; later rules
//! never relax an earlier decision:
//! 1. snapshot age exceeds the validity window: `EXPIRED`
//! 2. drift detected: `EXPIRED`, regardless of completeness
//! 3. completeness below 100: `DEGRADED`
//! 4. drift unknown: `DEGRADED` with `MEDIUM` confidence, even at 100%
//! 5. otherwise: `VALID` with `HIGH` confidence
//!
//! Versions differ only in the confidence each outcome carries and in how
//! many warnings are disclosed, captured by [`RuleProfile`]. Verdicts that
//! violate an invariant are rejected, never corrected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::error::TruthError;
use crate::core::identifiers::RulesetVersion;
use crate::core::truth::ConfidenceLevel;
use crate::core::truth::DriftStatus;
use crate::core::truth::OutputTruthMetadata;
use crate::core::truth::TruthInputs;
use crate::core::truth::ValidityStatus;
use crate::runtime::ruleset::TruthRuleset;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// First published ruleset version.
pub const RULESET_V1_0_0: &str = "1.0.0";

/// Ruleset with stricter completeness thresholds and per-dataset warnings.
pub const RULESET_V1_1_0: &str = "1.1.0";

/// Reason code prefix for snapshots older than their validity window.
pub const REASON_SNAPSHOT_EXPIRED: &str = "SNAPSHOT_EXPIRED";

/// Reason code prefix for detected configuration drift.
pub const REASON_DRIFT_DETECTED: &str = "DRIFT_DETECTED";

/// Reason code prefix for incomplete data.
pub const REASON_INCOMPLETE_DATA: &str = "INCOMPLETE_DATA";

/// Reason code prefix for undeterminable drift.
pub const REASON_DRIFT_UNKNOWN: &str = "DRIFT_UNKNOWN";

/// Upper bound for completeness percentages.
const MAX_COMPLETENESS_PERCENT: u8 = 100;

// ============================================================================
// SECTION: Rule Profiles
// ============================================================================

/// Version-specific parameters of the shared rule order.
///
/// # Invariants
/// - `medium_floor >= low_floor`; completeness at or above `medium_floor`
///   degrades to `MEDIUM`, at or above `low_floor` to `LOW`, and below that
///   to `INSUFFICIENT_DATA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleProfile {
    /// Version label.
    pub version_label: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Publication instant (unix seconds).
    pub published_unix_seconds: i64,
    /// Confidence for verdicts expired by snapshot age.
    pub expired_age_confidence: ConfidenceLevel,
    /// Confidence for verdicts expired by detected drift.
    pub drift_detected_confidence: ConfidenceLevel,
    /// Lowest completeness that still rates `MEDIUM`.
    pub medium_floor: u8,
    /// Lowest completeness that still rates `LOW`.
    pub low_floor: u8,
    /// Emit one warning per missing dataset on non-VALID verdicts.
    pub warn_per_missing_dataset: bool,
}

/// Built-in rule profiles in publication order.
const BUILTIN_PROFILES: [RuleProfile; 2] = [
    RuleProfile {
        version_label: RULESET_V1_0_0,
        description: "Initial truth rules",
        published_unix_seconds: 1_705_276_800,
        expired_age_confidence: ConfidenceLevel::Low,
        drift_detected_confidence: ConfidenceLevel::Low,
        medium_floor: 80,
        low_floor: 50,
        warn_per_missing_dataset: false,
    },
    RuleProfile {
        version_label: RULESET_V1_1_0,
        description: "Stricter completeness thresholds with per-dataset disclosure",
        published_unix_seconds: 1_725_148_800,
        expired_age_confidence: ConfidenceLevel::InsufficientData,
        drift_detected_confidence: ConfidenceLevel::Low,
        medium_floor: 90,
        low_floor: 60,
        warn_per_missing_dataset: true,
    },
];

impl RuleProfile {
    /// Returns the built-in profiles in publication order.
    #[must_use]
    pub const fn builtin() -> [Self; 2] {
        BUILTIN_PROFILES
    }

    /// Returns the profile version identifier.
    #[must_use]
    pub fn version(&self) -> RulesetVersion {
        RulesetVersion::new(self.version_label)
    }

    /// Rates confidence for a completeness-degraded verdict.
    const fn degraded_confidence(&self, completeness_percent: u8) -> ConfidenceLevel {
        if completeness_percent >= self.medium_floor {
            ConfidenceLevel::Medium
        } else if completeness_percent >= self.low_floor {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::InsufficientData
        }
    }
}

// ============================================================================
// SECTION: Rule Selection
// ============================================================================

/// Rule that decided a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruthRule {
    /// Snapshot older than the validity window.
    SnapshotExpired,
    /// Configuration drift detected.
    DriftDetected,
    /// Completeness below 100%.
    IncompleteData,
    /// Drift cannot be determined.
    DriftUnknown,
    /// No caveat applies.
    AllClear,
}

/// Selects the first matching rule in the fixed order.
#[must_use]
pub const fn select_rule(
    snapshot_age_seconds: u64,
    validity_window_seconds: u64,
    completeness_percent: u8,
    drift_status: DriftStatus,
) -> TruthRule {
    if snapshot_age_seconds > validity_window_seconds {
        TruthRule::SnapshotExpired
    } else if matches!(drift_status, DriftStatus::DriftDetected) {
        TruthRule::DriftDetected
    } else if completeness_percent < MAX_COMPLETENESS_PERCENT {
        TruthRule::IncompleteData
    } else if matches!(drift_status, DriftStatus::Unknown) {
        TruthRule::DriftUnknown
    } else {
        TruthRule::AllClear
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates inputs under a rule profile.
///
/// # Errors
///
/// Returns [`TruthError::Validation`] for out-of-range completeness, a
/// snapshot captured after generation, or an unrepresentable `validUntil`;
/// returns [`TruthError::Invariant`] when the verdict violates an invariant.
pub fn evaluate_truth(
    profile: &RuleProfile,
    inputs: &TruthInputs,
) -> Result<OutputTruthMetadata, TruthError> {
    let completeness = inputs.completeness_percent;
    if completeness > MAX_COMPLETENESS_PERCENT {
        return Err(TruthError::Validation(format!(
            "completenessPercent {completeness} outside 0-100"
        )));
    }
    let snapshot_age_seconds =
        inputs.generated_at.elapsed_seconds_ceil(&inputs.snapshot_captured_at).ok_or_else(|| {
            let ahead = inputs
                .snapshot_captured_at
                .elapsed_seconds_ceil(&inputs.generated_at)
                .unwrap_or(u64::MAX);
            TruthError::Validation(format!(
                "snapshot {} captured {ahead}s after generation",
                inputs.snapshot_id
            ))
        })?;
    let window = inputs.validity_window_seconds;
    let valid_until = inputs.snapshot_captured_at.checked_add_seconds(window).ok_or_else(|| {
        TruthError::Validation(format!("validity window {window}s overflows validUntil"))
    })?;

    let rule = select_rule(snapshot_age_seconds, window, completeness, inputs.drift_status);
    let (validity_status, confidence_level) = match rule {
        TruthRule::SnapshotExpired => (ValidityStatus::Expired, profile.expired_age_confidence),
        TruthRule::DriftDetected => (ValidityStatus::Expired, profile.drift_detected_confidence),
        TruthRule::IncompleteData => {
            (ValidityStatus::Degraded, profile.degraded_confidence(completeness))
        }
        TruthRule::DriftUnknown => (ValidityStatus::Degraded, ConfidenceLevel::Medium),
        TruthRule::AllClear => (ValidityStatus::Valid, ConfidenceLevel::High),
    };

    let mut reasons = Vec::new();
    let mut warnings = Vec::new();
    match rule {
        TruthRule::SnapshotExpired => {
            reasons.push(format!(
                "{REASON_SNAPSHOT_EXPIRED}: snapshot age {snapshot_age_seconds}s exceeds validity \
                 window {window}s"
            ));
            warnings.push(
                "Snapshot is older than its validity window; figures may be stale.".to_string(),
            );
        }
        TruthRule::DriftDetected => {
            reasons.push(format!(
                "{REASON_DRIFT_DETECTED}: governing configuration changed after snapshot {}",
                inputs.snapshot_id
            ));
            warnings.push(
                "Configuration drift detected; figures no longer reflect the live system."
                    .to_string(),
            );
        }
        TruthRule::IncompleteData => {
            reasons.push(format!(
                "{REASON_INCOMPLETE_DATA}: completeness {completeness}% below 100%"
            ));
            warnings.push(format!(
                "Data is {completeness}% complete; {} dataset(s) could not be read.",
                inputs.missing_data.len()
            ));
        }
        TruthRule::DriftUnknown => {
            reasons.push(format!(
                "{REASON_DRIFT_UNKNOWN}: drift cannot be determined from available evidence"
            ));
            warnings.push(
                "Configuration drift could not be verified; confidence is capped at MEDIUM."
                    .to_string(),
            );
        }
        TruthRule::AllClear => {}
    }
    if profile.warn_per_missing_dataset && rule != TruthRule::AllClear {
        warnings.extend(inputs.missing_data.iter().map(|name| format!("Missing dataset: {name}")));
    }

    let verdict = OutputTruthMetadata {
        generated_at: inputs.generated_at,
        snapshot_id: inputs.snapshot_id.clone(),
        snapshot_age_seconds,
        ruleset_version: profile.version(),
        completeness_percent: completeness,
        confidence_level,
        validity_status,
        drift_status: inputs.drift_status,
        missing_data: inputs.missing_data.clone(),
        warnings,
        reasons,
        valid_until,
    };
    if let Some(detail) = verdict.invariant_violation() {
        return Err(TruthError::Invariant {
            version: verdict.ruleset_version,
            detail,
        });
    }
    Ok(verdict)
}

// ============================================================================
// SECTION: Threshold Ruleset
// ============================================================================

/// Ruleset evaluator backed by a [`RuleProfile`].
#[derive(Debug, Clone, Copy)]
pub struct ThresholdRuleset {
    /// Version parameters.
    profile: RuleProfile,
}

impl ThresholdRuleset {
    /// Creates an evaluator for a profile.
    #[must_use]
    pub const fn new(profile: RuleProfile) -> Self {
        Self {
            profile,
        }
    }
}

impl TruthRuleset for ThresholdRuleset {
    fn compute_truth(&self, inputs: &TruthInputs) -> Result<OutputTruthMetadata, TruthError> {
        evaluate_truth(&self.profile, inputs)
    }
}

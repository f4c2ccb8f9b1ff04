// crates/truth-evidence-core/tests/truth_rules.rs
// ============================================================================
// Module: Truth Rule Tests
// Description: Rule order, confidence tables, and verdict invariants.
// ============================================================================
//! ## Overview
//! Exercises the built-in rulesets against the documented scenarios, the
//! drift invariant at 0%, 50%, and 100% completeness, drift precedence, and
//! input validation.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeSet;

use truth_evidence_core::ConfidenceLevel;
use truth_evidence_core::DriftStatus;
use truth_evidence_core::OutputTruthMetadata;
use truth_evidence_core::RulesetRegistry;
use truth_evidence_core::RulesetVersion;
use truth_evidence_core::TruthError;
use truth_evidence_core::TruthInputs;
use truth_evidence_core::ValidityStatus;
use truth_evidence_core::runtime::RULESET_V1_0_0;
use truth_evidence_core::runtime::RULESET_V1_1_0;

use crate::common::CAPTURED_AT;
use crate::common::GENERATED_AT;
use crate::common::inputs;
use crate::common::ts;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Evaluates inputs under a built-in ruleset version.
fn evaluate(version: &str, inputs: &TruthInputs) -> Result<OutputTruthMetadata, TruthError> {
    let registry = RulesetRegistry::builtin().unwrap();
    registry.get(&RulesetVersion::new(version)).unwrap().compute_truth(inputs)
}

/// Returns both built-in ruleset versions.
const fn versions() -> [&'static str; 2] {
    [RULESET_V1_0_0, RULESET_V1_1_0]
}

// ============================================================================
// SECTION: Scenarios
// ============================================================================

/// Tests complete, fresh, drift-free data is VALID with HIGH confidence.
#[test]
fn test_complete_fresh_no_drift_is_valid() {
    for version in versions() {
        let verdict = evaluate(version, &inputs(100, DriftStatus::NoDrift)).unwrap();
        assert_eq!(verdict.validity_status, ValidityStatus::Valid);
        assert_eq!(verdict.confidence_level, ConfidenceLevel::High);
        assert!(verdict.warnings.is_empty());
        assert!(verdict.reasons.is_empty());
        assert_eq!(verdict.ruleset_version.as_str(), version);
        assert!(verdict.is_exportable_without_acknowledgment());
    }
}

/// Tests unknown drift at full completeness degrades to MEDIUM.
#[test]
fn test_unknown_drift_at_full_completeness_is_degraded_medium() {
    for version in versions() {
        let verdict = evaluate(version, &inputs(100, DriftStatus::Unknown)).unwrap();
        assert_eq!(verdict.validity_status, ValidityStatus::Degraded);
        assert_eq!(verdict.confidence_level, ConfidenceLevel::Medium);
        assert!(!verdict.warnings.is_empty());
        assert!(!verdict.reasons.is_empty());
        assert!(verdict.reasons[0].starts_with("DRIFT_UNKNOWN"));
        assert!(!verdict.is_exportable_without_acknowledgment());
    }
}

/// Tests incomplete data degrades the verdict.
#[test]
fn test_incomplete_data_is_degraded() {
    for version in versions() {
        let verdict = evaluate(version, &inputs(60, DriftStatus::NoDrift)).unwrap();
        assert_eq!(verdict.validity_status, ValidityStatus::Degraded);
        assert_eq!(verdict.confidence_level, ConfidenceLevel::Low);
        assert!(verdict.reasons[0].starts_with("INCOMPLETE_DATA"));
    }
}

/// Tests detected drift expires the verdict even at full completeness.
#[test]
fn test_drift_detected_wins_over_completeness() {
    for version in versions() {
        for completeness in [0, 50, 100] {
            let detected = inputs(completeness, DriftStatus::DriftDetected);
            let verdict = evaluate(version, &detected).unwrap();
            assert_eq!(verdict.validity_status, ValidityStatus::Expired);
            assert_eq!(verdict.confidence_level, ConfidenceLevel::Low);
            assert!(verdict.reasons[0].starts_with("DRIFT_DETECTED"));
        }
    }
}

// ============================================================================
// SECTION: Invariants
// ============================================================================

/// Tests unknown drift never yields VALID or HIGH at 0%, 50%, and 100%.
#[test]
fn test_unknown_drift_never_valid_or_high() {
    for version in versions() {
        for completeness in [0, 50, 100] {
            let verdict = evaluate(version, &inputs(completeness, DriftStatus::Unknown)).unwrap();
            assert_ne!(verdict.validity_status, ValidityStatus::Valid);
            assert_ne!(verdict.confidence_level, ConfidenceLevel::High);
            assert!(verdict.invariant_violation().is_none());
        }
    }
}

/// Tests expired snapshots win over every later rule.
#[test]
fn test_snapshot_age_expires_first() {
    let stale = TruthInputs {
        validity_window_seconds: 3_600,
        ..inputs(100, DriftStatus::NoDrift)
    };
    let old = evaluate(RULESET_V1_0_0, &stale).unwrap();
    assert_eq!(old.validity_status, ValidityStatus::Expired);
    assert_eq!(old.confidence_level, ConfidenceLevel::Low);
    assert!(old.reasons[0].starts_with("SNAPSHOT_EXPIRED"));

    let new = evaluate(RULESET_V1_1_0, &stale).unwrap();
    assert_eq!(new.validity_status, ValidityStatus::Expired);
    assert_eq!(new.confidence_level, ConfidenceLevel::InsufficientData);
}

/// Tests an age equal to the window is still fresh.
#[test]
fn test_age_equal_to_window_is_fresh() {
    let boundary = TruthInputs {
        validity_window_seconds: 6 * 3_600,
        ..inputs(100, DriftStatus::NoDrift)
    };
    let verdict = evaluate(RULESET_V1_1_0, &boundary).unwrap();
    assert_eq!(verdict.validity_status, ValidityStatus::Valid);
    assert_eq!(verdict.snapshot_age_seconds, 6 * 3_600);
}

/// Tests a fractional second past the window expires the snapshot.
#[test]
fn test_fractional_overrun_expires() {
    let overrun = TruthInputs {
        generated_at: ts("2025-03-01T13:00:00.900Z"),
        snapshot_captured_at: ts("2025-03-01T12:00:00Z"),
        validity_window_seconds: 3_600,
        ..inputs(100, DriftStatus::NoDrift)
    };
    for version in versions() {
        let verdict = evaluate(version, &overrun).unwrap();
        assert_eq!(verdict.validity_status, ValidityStatus::Expired, "{version}");
        assert_ne!(verdict.confidence_level, ConfidenceLevel::High, "{version}");
        assert_eq!(verdict.snapshot_age_seconds, 3_601);
    }

    let exact = TruthInputs {
        generated_at: ts("2025-03-01T13:00:00.000Z"),
        ..overrun
    };
    let verdict = evaluate(RULESET_V1_1_0, &exact).unwrap();
    assert_eq!(verdict.validity_status, ValidityStatus::Valid);
    assert_eq!(verdict.snapshot_age_seconds, 3_600);
}

/// Tests derived verdict fields.
#[test]
fn test_derived_fields() {
    let verdict = evaluate(RULESET_V1_1_0, &inputs(100, DriftStatus::NoDrift)).unwrap();
    assert_eq!(verdict.generated_at, ts(GENERATED_AT));
    assert_eq!(verdict.snapshot_age_seconds, 21_600);
    assert_eq!(verdict.valid_until, ts("2025-03-02T06:00:00Z"));
    assert_eq!(verdict.snapshot_id.as_str(), "snap-001");
}

// ============================================================================
// SECTION: Confidence Tables
// ============================================================================

/// Tests the completeness thresholds of each ruleset.
#[test]
fn test_degraded_confidence_thresholds() {
    let cases = [
        (RULESET_V1_0_0, 80, ConfidenceLevel::Medium),
        (RULESET_V1_0_0, 79, ConfidenceLevel::Low),
        (RULESET_V1_0_0, 50, ConfidenceLevel::Low),
        (RULESET_V1_0_0, 49, ConfidenceLevel::InsufficientData),
        (RULESET_V1_1_0, 90, ConfidenceLevel::Medium),
        (RULESET_V1_1_0, 89, ConfidenceLevel::Low),
        (RULESET_V1_1_0, 60, ConfidenceLevel::Low),
        (RULESET_V1_1_0, 59, ConfidenceLevel::InsufficientData),
        (RULESET_V1_1_0, 0, ConfidenceLevel::InsufficientData),
    ];
    for (version, completeness, expected) in cases {
        let verdict = evaluate(version, &inputs(completeness, DriftStatus::NoDrift)).unwrap();
        assert_eq!(verdict.validity_status, ValidityStatus::Degraded);
        assert_eq!(verdict.confidence_level, expected, "{version} at {completeness}%");
    }
}

/// Tests the newer ruleset discloses each missing dataset in sorted order.
#[test]
fn test_per_dataset_warnings() {
    let with_missing = TruthInputs {
        missing_data: BTreeSet::from(["usage".to_string(), "billing".to_string()]),
        ..inputs(80, DriftStatus::NoDrift)
    };
    let old = evaluate(RULESET_V1_0_0, &with_missing).unwrap();
    assert_eq!(old.warnings.len(), 1);

    let new = evaluate(RULESET_V1_1_0, &with_missing).unwrap();
    assert_eq!(new.warnings.len(), 3);
    assert_eq!(new.warnings[1], "Missing dataset: billing");
    assert_eq!(new.warnings[2], "Missing dataset: usage");
    assert_eq!(new.reasons.len(), 1);
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Tests a snapshot captured after generation is rejected.
#[test]
fn test_capture_after_generation_rejected() {
    let future = TruthInputs {
        generated_at: ts(CAPTURED_AT),
        snapshot_captured_at: ts(GENERATED_AT),
        ..inputs(100, DriftStatus::NoDrift)
    };
    let err = evaluate(RULESET_V1_1_0, &future).unwrap_err();
    assert!(matches!(err, TruthError::Validation(_)));
}

/// Tests a capture less than a second after generation is also rejected.
#[test]
fn test_subsecond_capture_after_generation_rejected() {
    let future = TruthInputs {
        generated_at: ts("2025-03-01T12:00:00Z"),
        snapshot_captured_at: ts("2025-03-01T12:00:00.500Z"),
        ..inputs(100, DriftStatus::NoDrift)
    };
    let err = evaluate(RULESET_V1_1_0, &future).unwrap_err();
    let TruthError::Validation(detail) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(detail.contains("captured 1s after generation"));
}

/// Tests completeness above 100 is rejected.
#[test]
fn test_completeness_out_of_range_rejected() {
    let err = evaluate(RULESET_V1_1_0, &inputs(101, DriftStatus::NoDrift)).unwrap_err();
    assert!(matches!(err, TruthError::Validation(_)));
}

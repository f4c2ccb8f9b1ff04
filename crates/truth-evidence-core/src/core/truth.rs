// crates/truth-evidence-core/src/core/truth.rs
// ============================================================================
// Module: Truth Verdict Types
// Description: Validity, confidence, and drift vocabularies plus the verdict record.
// Purpose: Define the truth statement attached to every generated report.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! [`OutputTruthMetadata`] is the verdict a ruleset produces for one set of
//! observability facts. Two invariants hold for every verdict:
//! - `validity_status == VALID` exactly when `warnings` and `reasons` are both empty.
//! - `drift_status == UNKNOWN` never yields `VALID` or `HIGH` confidence.
//!
//! [`OutputTruthMetadata::invariant_violation`] checks both; evaluators treat a
//! violation as fatal rather than correcting it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RulesetVersion;
use crate::core::identifiers::SnapshotId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Vocabularies
// ============================================================================

/// Confidence in a report's figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    /// Complete, fresh, drift-free data.
    High,
    /// Usable with caveats.
    Medium,
    /// Substantially impaired.
    Low,
    /// Too little data to support a conclusion.
    InsufficientData,
}

impl ConfidenceLevel {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validity of a report's figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidityStatus {
    /// No caveats apply.
    Valid,
    /// Figures are usable but incomplete or of unknown drift.
    Degraded,
    /// Figures are stale or known to be superseded.
    Expired,
    /// Figures must not be used.
    Invalid,
}

impl ValidityStatus {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Degraded => "DEGRADED",
            Self::Expired => "EXPIRED",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for ValidityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the governing configuration of the source system changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftStatus {
    /// Configuration is known to be unchanged.
    NoDrift,
    /// Configuration is known to have changed.
    DriftDetected,
    /// Drift cannot be determined from the available evidence.
    Unknown,
}

impl DriftStatus {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoDrift => "NO_DRIFT",
            Self::DriftDetected => "DRIFT_DETECTED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Evaluator Inputs
// ============================================================================

/// Facts fed to a ruleset evaluator.
///
/// # Invariants
/// - `missing_data` is an ordered set, so evaluation never depends on the
///   order datasets were reported in.
/// - `generated_at` is the evaluation instant; evaluators never consult the
///   wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruthInputs {
    /// Evaluation instant.
    pub generated_at: Timestamp,
    /// Snapshot the verdict refers to.
    pub snapshot_id: SnapshotId,
    /// Instant the snapshot was captured.
    pub snapshot_captured_at: Timestamp,
    /// Data completeness in percent (0-100).
    pub completeness_percent: u8,
    /// Drift status of the governing configuration.
    pub drift_status: DriftStatus,
    /// Names of datasets that could not be read.
    pub missing_data: BTreeSet<String>,
    /// Maximum snapshot age, in seconds, before the verdict expires.
    pub validity_window_seconds: u64,
}

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Truth statement attached to a generated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputTruthMetadata {
    /// Evaluation instant.
    pub generated_at: Timestamp,
    /// Snapshot the verdict refers to.
    pub snapshot_id: SnapshotId,
    /// Snapshot age at evaluation, in seconds.
    pub snapshot_age_seconds: u64,
    /// Ruleset version that produced the verdict.
    pub ruleset_version: RulesetVersion,
    /// Data completeness in percent (0-100).
    pub completeness_percent: u8,
    /// Confidence level.
    pub confidence_level: ConfidenceLevel,
    /// Validity status.
    pub validity_status: ValidityStatus,
    /// Drift status the verdict was computed under.
    pub drift_status: DriftStatus,
    /// Names of datasets that could not be read.
    pub missing_data: BTreeSet<String>,
    /// Human-readable warnings, in emission order.
    pub warnings: Vec<String>,
    /// Machine-readable reasons, in emission order.
    pub reasons: Vec<String>,
    /// Instant after which the verdict no longer holds.
    pub valid_until: Timestamp,
}

impl OutputTruthMetadata {
    /// Returns a description of the first violated verdict invariant, if any.
    #[must_use]
    pub fn invariant_violation(&self) -> Option<String> {
        let disclosed = !self.warnings.is_empty() && !self.reasons.is_empty();
        let silent = self.warnings.is_empty() && self.reasons.is_empty();
        match self.validity_status {
            ValidityStatus::Valid if !silent => {
                return Some("VALID verdict carries warnings or reasons".to_string());
            }
            ValidityStatus::Degraded | ValidityStatus::Expired | ValidityStatus::Invalid
                if !disclosed =>
            {
                return Some(format!(
                    "{} verdict must carry both warnings and reasons",
                    self.validity_status
                ));
            }
            _ => {}
        }
        if self.drift_status == DriftStatus::Unknown {
            if self.validity_status == ValidityStatus::Valid {
                return Some("UNKNOWN drift cannot produce a VALID verdict".to_string());
            }
            if self.confidence_level == ConfidenceLevel::High {
                return Some("UNKNOWN drift cannot produce HIGH confidence".to_string());
            }
        }
        None
    }

    /// Returns true when the verdict may be exported without human acknowledgment.
    #[must_use]
    pub fn is_exportable_without_acknowledgment(&self) -> bool {
        self.validity_status == ValidityStatus::Valid
    }
}

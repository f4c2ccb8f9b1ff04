// crates/truth-evidence-core/src/core/error.rs
// ============================================================================
// Module: Truth Evidence Errors
// Description: Single tagged error taxonomy for the evidence engine.
// Purpose: Make every failure explicit, typed, and exhaustively matchable.
// Dependencies: crate::core::{hashing, identifiers}, serde, thiserror
// ============================================================================

//! ## Overview
//! Every operation in the engine fails with [`TruthError`]. Errors are fatal
//! to the operation in progress and are never retried internally: the
//! compute paths are pure, so a retry cannot change the outcome. The engine
//! never substitutes a best-effort verdict for an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::hashing::HashError;
use crate::core::identifiers::RulesetVersion;
use crate::core::identifiers::SchemaVersion;

// ============================================================================
// SECTION: Ruleset Errors
// ============================================================================

/// Reason a ruleset registry invariant was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RulesetErrorReason {
    /// No ruleset is registered under the version.
    NotFound,
    /// A ruleset is already registered under the version.
    AlreadyExists,
    /// A ruleset's declared or stamped version disagrees with its key.
    SchemaMismatch,
}

impl RulesetErrorReason {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::SchemaMismatch => "SCHEMA_MISMATCH",
        }
    }
}

impl fmt::Display for RulesetErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ruleset registry invariant violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ruleset {version}: {reason}")]
pub struct RulesetInvariantError {
    /// Ruleset version involved.
    pub version: RulesetVersion,
    /// Violated invariant.
    pub reason: RulesetErrorReason,
}

impl RulesetInvariantError {
    /// Creates a `NOT_FOUND` error.
    #[must_use]
    pub const fn not_found(version: RulesetVersion) -> Self {
        Self {
            version,
            reason: RulesetErrorReason::NotFound,
        }
    }
}

// ============================================================================
// SECTION: Migration Errors
// ============================================================================

/// Missing or failing link in the schema migration chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no schema migration from {from_version} to {to_version}: {detail}")]
pub struct SchemaMigrationError {
    /// Schema version at which the chain broke.
    pub from_version: SchemaVersion,
    /// Version the chain was heading to.
    pub to_version: SchemaVersion,
    /// Description of the break.
    pub detail: String,
}

// ============================================================================
// SECTION: Gate Errors
// ============================================================================

/// Compatibility gate identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    /// The pinned ruleset must resolve through the registry.
    RulesetExists,
    /// The schema version must have a complete migration path.
    SchemaMigratable,
}

impl GateKind {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RulesetExists => "ruleset_exists",
            Self::SchemaMigratable => "schema_migratable",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail of a compatibility gate failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateFailure {
    /// The pinned ruleset did not resolve.
    #[error(transparent)]
    Ruleset(RulesetInvariantError),
    /// The schema has no complete migration path.
    #[error(transparent)]
    Migration(SchemaMigrationError),
    /// The `rulesetVersion` field is present but unusable.
    #[error("malformed rulesetVersion: {0}")]
    MalformedRulesetVersion(String),
    /// The `schemaVersion` field is missing or unusable.
    #[error("malformed schemaVersion: {0}")]
    MalformedSchemaVersion(String),
}

// ============================================================================
// SECTION: Engine Error
// ============================================================================

/// Errors raised by the evidence engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TruthError {
    /// Ruleset registry invariant violated.
    #[error(transparent)]
    Ruleset(#[from] RulesetInvariantError),
    /// Schema migration chain broken.
    #[error(transparent)]
    SchemaMigration(#[from] SchemaMigrationError),
    /// A compatibility gate refused the bundle.
    #[error("compatibility gate {gate} failed: {failure}")]
    CompatibilityGate {
        /// Gate that failed.
        gate: GateKind,
        /// Failure detail.
        failure: GateFailure,
    },
    /// Structurally incomplete or inconsistent bundle or input.
    #[error("validation error: {0}")]
    Validation(String),
    /// Evaluator post-condition violated.
    #[error("truth invariant violated by ruleset {version}: {detail}")]
    Invariant {
        /// Ruleset that produced the verdict.
        version: RulesetVersion,
        /// Violated invariant.
        detail: String,
    },
    /// Registry is unusable (duplicate migration link or poisoned lock).
    #[error("registry error: {0}")]
    Registry(String),
    /// Canonicalization or hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl TruthError {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Ruleset(err) => match err.reason {
                RulesetErrorReason::NotFound => "ruleset_not_found",
                RulesetErrorReason::AlreadyExists => "ruleset_already_exists",
                RulesetErrorReason::SchemaMismatch => "ruleset_schema_mismatch",
            },
            Self::SchemaMigration(_) => "schema_migration",
            Self::CompatibilityGate {
                gate, ..
            } => match gate {
                GateKind::RulesetExists => "gate_ruleset_exists",
                GateKind::SchemaMigratable => "gate_schema_migratable",
            },
            Self::Validation(_) => "validation",
            Self::Invariant {
                ..
            } => "invariant",
            Self::Registry(_) => "registry",
            Self::Hash(_) => "hash",
        }
    }

    /// Returns the ruleset invariant reason, looking through gate failures.
    #[must_use]
    pub const fn ruleset_reason(&self) -> Option<RulesetErrorReason> {
        match self {
            Self::Ruleset(err)
            | Self::CompatibilityGate {
                failure: GateFailure::Ruleset(err),
                ..
            } => Some(err.reason),
            _ => None,
        }
    }
}

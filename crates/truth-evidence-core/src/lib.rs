// crates/truth-evidence-core/src/lib.rs
// ============================================================================
// Module: Truth Evidence Core Library
// Description: Public API surface for the truth evidence engine.
// Purpose: Expose core types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Truth evidence core turns observability facts into a validity and
//! confidence verdict, seals that verdict into a hashed evidence bundle that
//! pins the ruleset version used, and reproduces the exact verdict later from
//! the stored bundle alone. It never contacts the network and never reads the
//! wall clock while computing a verdict.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::AppendOutcome;
pub use interfaces::EvidenceStore;
pub use interfaces::StoreError;
pub use runtime::AuditSink;
pub use runtime::CompatibilityGate;
pub use runtime::DEFAULT_MAX_BUNDLE_BYTES;
pub use runtime::EngineError;
pub use runtime::EvidenceEngine;
pub use runtime::EvidenceSealer;
pub use runtime::FileAuditSink;
pub use runtime::InMemoryEvidenceStore;
pub use runtime::LEGACY_RULESET_VERSION;
pub use runtime::MigrationRegistry;
pub use runtime::NoopAuditSink;
pub use runtime::Regenerator;
pub use runtime::RulesetDefinition;
pub use runtime::RulesetRegistry;
pub use runtime::SealRequest;
pub use runtime::ShadowEvaluationResult;
pub use runtime::ShadowEvaluator;
pub use runtime::StderrAuditSink;
pub use runtime::TruthRuleset;
pub use runtime::VerificationReport;
pub use runtime::VerificationStatus;
pub use runtime::Verifier;

// crates/truth-evidence-core/src/runtime/mod.rs
// ============================================================================
// Module: Truth Evidence Runtime
// Description: Registries, evaluator, regeneration pipeline, and engine facade.
// Purpose: Seal, regenerate, verify, and shadow-evaluate evidence bundles.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the evidence-and-regeneration engine. Every
//! compute component is synchronous and side-effect free; only the engine
//! facade touches the store or the audit sink. All entry points (library,
//! CLI) call into the same components to preserve reproducibility.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod derive;
pub mod engine;
pub mod gate;
pub mod migration;
pub mod regenerate;
pub mod rules;
pub mod ruleset;
pub mod seal;
pub mod shadow;
pub mod store;
pub mod verify;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEventKind;
pub use audit::AuditOutcome;
pub use audit::AuditSink;
pub use audit::EvidenceAuditEvent;
pub use audit::EvidenceAuditEventParams;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use derive::COMPLETENESS_PENALTY_PER_MISSING_DATASET;
pub use derive::completeness_from_missing;
pub use derive::derive_truth_inputs;
pub use engine::DEFAULT_MAX_BUNDLE_BYTES;
pub use engine::EngineError;
pub use engine::EvidenceEngine;
pub use engine::SealOutcome;
pub use gate::CompatibilityGate;
pub use gate::GateClearance;
pub use gate::LEGACY_RULESET_VERSION;
pub use migration::MigrationRegistry;
pub use migration::SchemaMigration;
pub use regenerate::Regeneration;
pub use regenerate::Regenerator;
pub use rules::RULESET_V1_0_0;
pub use rules::RULESET_V1_1_0;
pub use rules::RuleProfile;
pub use rules::ThresholdRuleset;
pub use rules::evaluate_truth;
pub use ruleset::RulesetDefinition;
pub use ruleset::RulesetRegistry;
pub use ruleset::RulesetSummary;
pub use ruleset::TruthRuleset;
pub use seal::EvidenceSealer;
pub use seal::SealRequest;
pub use shadow::ShadowEvaluationResult;
pub use shadow::ShadowEvaluator;
pub use shadow::ShadowStatus;
pub use store::InMemoryEvidenceStore;
pub use store::SharedEvidenceStore;
pub use verify::FieldDifference;
pub use verify::VerdictField;
pub use verify::VerificationReport;
pub use verify::VerificationStatus;
pub use verify::Verifier;

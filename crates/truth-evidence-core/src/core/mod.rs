// crates/truth-evidence-core/src/core/mod.rs
// ============================================================================
// Module: Truth Evidence Core Types
// Description: Canonical verdict, bundle, identifier, and error types.
// Purpose: Provide stable, serializable types shared by every engine component.
// Dependencies: serde, serde_jcs, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! Core types define the truth verdict, the sealed evidence bundle, and the
//! canonical hashing used to make stored bundles tamper-evident. These types
//! are the canonical source of truth for the persisted record shape.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod error;
pub mod evidence;
pub mod hashing;
pub mod identifiers;
pub mod time;
pub mod truth;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::GateFailure;
pub use error::GateKind;
pub use error::RulesetErrorReason;
pub use error::RulesetInvariantError;
pub use error::SchemaMigrationError;
pub use error::TruthError;
pub use evidence::CURRENT_SCHEMA_VERSION;
pub use evidence::DriftStatusAtGeneration;
pub use evidence::EnvironmentFacts;
pub use evidence::EvidenceBundle;
pub use evidence::MissingDataEntry;
pub use evidence::NormalizedInputs;
pub use evidence::SnapshotRef;
pub use evidence::hash_evidence_document;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::CloudId;
pub use identifiers::EvidenceId;
pub use identifiers::RulesetVersion;
pub use identifiers::SchemaVersion;
pub use identifiers::SnapshotId;
pub use identifiers::TenantKey;
pub use time::Timestamp;
pub use time::TimestampError;
pub use truth::ConfidenceLevel;
pub use truth::DriftStatus;
pub use truth::OutputTruthMetadata;
pub use truth::TruthInputs;
pub use truth::ValidityStatus;

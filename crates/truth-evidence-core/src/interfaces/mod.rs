// crates/truth-evidence-core/src/interfaces/mod.rs
// ============================================================================
// Module: Truth Evidence Interfaces
// Description: Backend-agnostic persistence contract for evidence bundles.
// Purpose: Define the storage surface consumed by the evidence engine.
// Dependencies: crate::core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The evidence store is the only component that performs I/O. Bundles are
//! persisted as JSON documents so that records written under any historical
//! schema version stay loadable; typing happens after migration.
//!
//! Implementations must make [`EvidenceStore::append_if_absent`] atomic per
//! key: a write for an existing identifier is a no-op, never an overwrite.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::evidence::fields;
use crate::core::identifiers::EvidenceId;

// ============================================================================
// SECTION: Evidence Store
// ============================================================================

/// Result of an append-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// True when the bundle was written; false when the id already existed.
    pub inserted: bool,
}

/// Evidence store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("evidence store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("evidence store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("evidence store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("evidence store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("evidence store error: {0}")]
    Store(String),
}

/// Append-only persistence for evidence bundle documents.
pub trait EvidenceStore {
    /// Loads a bundle document by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn get(&self, evidence_id: &EvidenceId) -> Result<Option<Value>, StoreError>;

    /// Stores a bundle document unless one already exists under the id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails or the document's
    /// `evidenceId` does not match the key.
    fn append_if_absent(
        &self,
        evidence_id: &EvidenceId,
        document: &Value,
    ) -> Result<AppendOutcome, StoreError>;
}

/// Checks that a document's `evidenceId` field equals the storage key.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] when the field is missing or differs.
pub fn ensure_document_key(evidence_id: &EvidenceId, document: &Value) -> Result<(), StoreError> {
    match document.get(fields::EVIDENCE_ID).and_then(Value::as_str) {
        Some(id) if id == evidence_id.as_str() => Ok(()),
        Some(id) => Err(StoreError::Invalid(format!(
            "document evidenceId {id} does not match key {evidence_id}"
        ))),
        None => Err(StoreError::Invalid("document missing evidenceId".to_string())),
    }
}

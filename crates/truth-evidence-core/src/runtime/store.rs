// crates/truth-evidence-core/src/runtime/store.rs
// ============================================================================
// Module: Truth Evidence In-Memory Store
// Description: Simple in-memory evidence store for tests and offline tools.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`EvidenceStore`] and
//! a shared wrapper over any store. The in-memory store checks and inserts
//! under one lock, which makes `append_if_absent` atomic per key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Value;

use crate::core::identifiers::EvidenceId;
use crate::interfaces::AppendOutcome;
use crate::interfaces::EvidenceStore;
use crate::interfaces::StoreError;
use crate::interfaces::ensure_document_key;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory evidence store for tests and offline tools.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEvidenceStore {
    /// Bundle documents protected by a mutex.
    bundles: Arc<Mutex<BTreeMap<EvidenceId, Value>>>,
}

impl InMemoryEvidenceStore {
    /// Creates a new in-memory evidence store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bundles: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Returns the number of stored bundles.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Store`] when the store mutex is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        let guard = self
            .bundles
            .lock()
            .map_err(|_| StoreError::Store("evidence store mutex poisoned".to_string()))?;
        Ok(guard.len())
    }

    /// Returns true when no bundles are stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Store`] when the store mutex is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|len| len == 0)
    }
}

impl EvidenceStore for InMemoryEvidenceStore {
    fn get(&self, evidence_id: &EvidenceId) -> Result<Option<Value>, StoreError> {
        let guard = self
            .bundles
            .lock()
            .map_err(|_| StoreError::Store("evidence store mutex poisoned".to_string()))?;
        Ok(guard.get(evidence_id).cloned())
    }

    fn append_if_absent(
        &self,
        evidence_id: &EvidenceId,
        document: &Value,
    ) -> Result<AppendOutcome, StoreError> {
        ensure_document_key(evidence_id, document)?;
        let mut guard = self
            .bundles
            .lock()
            .map_err(|_| StoreError::Store("evidence store mutex poisoned".to_string()))?;
        if guard.contains_key(evidence_id) {
            return Ok(AppendOutcome {
                inserted: false,
            });
        }
        guard.insert(evidence_id.clone(), document.clone());
        drop(guard);
        Ok(AppendOutcome {
            inserted: true,
        })
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared evidence store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedEvidenceStore {
    /// Inner store implementation.
    inner: Arc<dyn EvidenceStore + Send + Sync>,
}

impl SharedEvidenceStore {
    /// Wraps an evidence store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl EvidenceStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn EvidenceStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl EvidenceStore for SharedEvidenceStore {
    fn get(&self, evidence_id: &EvidenceId) -> Result<Option<Value>, StoreError> {
        self.inner.get(evidence_id)
    }

    fn append_if_absent(
        &self,
        evidence_id: &EvidenceId,
        document: &Value,
    ) -> Result<AppendOutcome, StoreError> {
        self.inner.append_if_absent(evidence_id, document)
    }
}

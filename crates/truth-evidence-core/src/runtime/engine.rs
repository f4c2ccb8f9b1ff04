// crates/truth-evidence-core/src/runtime/engine.rs
// ============================================================================
// Module: Evidence Engine
// Description: Facade wiring registries, store, and audit sink together.
// Purpose: Offer seal, regenerate, verify, and shadow by evidence identifier.
// Dependencies: crate::{core, interfaces, runtime}, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`EvidenceEngine`] owns the two write-once registries, an evidence store,
//! and an audit sink. It is the only component that both performs I/O and
//! emits audit events; every verdict it returns comes from the pure compute
//! components. A verification mismatch is returned and audited, never
//! swallowed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::error::TruthError;
use crate::core::evidence::EvidenceBundle;
use crate::core::evidence::hash_evidence_document;
use crate::core::hashing::HashDigest;
use crate::core::hashing::canonical_json_bytes_with_limit;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::TenantKey;
use crate::core::time::Timestamp;
use crate::interfaces::EvidenceStore;
use crate::interfaces::StoreError;
use crate::runtime::audit::AuditEventKind;
use crate::runtime::audit::AuditOutcome;
use crate::runtime::audit::AuditSink;
use crate::runtime::audit::EvidenceAuditEvent;
use crate::runtime::audit::EvidenceAuditEventParams;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::migration::MigrationRegistry;
use crate::runtime::regenerate::Regeneration;
use crate::runtime::regenerate::Regenerator;
use crate::runtime::ruleset::RulesetRegistry;
use crate::runtime::seal::EvidenceSealer;
use crate::runtime::seal::SealRequest;
use crate::runtime::shadow::ShadowEvaluationResult;
use crate::runtime::shadow::ShadowEvaluator;
use crate::runtime::verify::VerificationReport;
use crate::runtime::verify::Verifier;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum canonical size of a stored bundle (bytes).
pub const DEFAULT_MAX_BUNDLE_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Evidence engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Compute component failed.
    #[error(transparent)]
    Truth(#[from] TruthError),
    /// Evidence store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// No bundle is stored under the identifier.
    #[error("evidence bundle not found: {0}")]
    NotFound(EvidenceId),
}

impl EngineError {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Truth(err) => err.kind_label(),
            Self::Store(_) => "store",
            Self::NotFound(_) => "not_found",
        }
    }
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of sealing and appending a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealOutcome {
    /// Sealed bundle.
    pub bundle: EvidenceBundle,
    /// True when the bundle was written; false when the id already existed.
    pub inserted: bool,
    /// Digest of the document the store holds under the id, which is the
    /// earlier record when `inserted` is false.
    pub stored_hash: HashDigest,
}

/// Evidence engine facade.
pub struct EvidenceEngine<S> {
    /// Ruleset registry.
    rulesets: RulesetRegistry,
    /// Schema migration registry.
    migrations: MigrationRegistry,
    /// Evidence store.
    store: S,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
    /// Maximum canonical bundle size accepted for storage.
    max_bundle_bytes: usize,
}

impl<S: EvidenceStore> EvidenceEngine<S> {
    /// Creates an engine from explicit components.
    #[must_use]
    pub fn new(
        rulesets: RulesetRegistry,
        migrations: MigrationRegistry,
        store: S,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            rulesets,
            migrations,
            store,
            audit,
            max_bundle_bytes: DEFAULT_MAX_BUNDLE_BYTES,
        }
    }

    /// Creates an engine with the built-in registries and no audit output.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError`] when the built-in tables are inconsistent.
    pub fn with_builtin_registries(store: S) -> Result<Self, TruthError> {
        Ok(Self::new(
            RulesetRegistry::builtin()?,
            MigrationRegistry::builtin()?,
            store,
            Arc::new(NoopAuditSink),
        ))
    }

    /// Sets the maximum canonical bundle size accepted for storage.
    #[must_use]
    pub const fn with_max_bundle_bytes(mut self, max_bundle_bytes: usize) -> Self {
        self.max_bundle_bytes = max_bundle_bytes;
        self
    }

    /// Returns the ruleset registry.
    #[must_use]
    pub const fn rulesets(&self) -> &RulesetRegistry {
        &self.rulesets
    }

    /// Returns the migration registry.
    #[must_use]
    pub const fn migrations(&self) -> &MigrationRegistry {
        &self.migrations
    }

    /// Returns the evidence store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns a regenerator over the engine registries.
    #[must_use]
    pub const fn regenerator(&self) -> Regenerator<'_> {
        Regenerator::new(&self.rulesets, &self.migrations)
    }

    /// Seals a request under the current ruleset and appends the bundle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when sealing, the size limit, or the store fails.
    pub fn seal_and_store(&self, request: SealRequest) -> Result<SealOutcome, EngineError> {
        let bundle = EvidenceSealer::new(&self.rulesets).seal(request)?;
        let document = bundle.to_document().map_err(TruthError::from)?;
        canonical_json_bytes_with_limit(&document, self.max_bundle_bytes)
            .map_err(TruthError::from)?;
        let outcome = self.store.append_if_absent(&bundle.evidence_id, &document)?;
        let stored_hash = if outcome.inserted {
            hash_evidence_document(&document).map_err(TruthError::from)?
        } else {
            self.stored_digest(&bundle.evidence_id)?
        };
        self.audit.record(&EvidenceAuditEvent::new(EvidenceAuditEventParams {
            kind: AuditEventKind::EvidenceSealed,
            evidence_id: bundle.evidence_id.to_string(),
            tenant_key: Some(bundle.tenant_key.to_string()),
            ruleset_version: bundle.ruleset_version.as_ref().map(ToString::to_string),
            outcome: AuditOutcome::Ok,
            inserted: Some(outcome.inserted),
            differences: None,
            error_kind: None,
            bundle_hash: Some(stored_hash.value.clone()),
        }));
        Ok(SealOutcome {
            bundle,
            inserted: outcome.inserted,
            stored_hash,
        })
    }

    /// Recomputes the digest of the document stored under an id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when no bundle is stored under the id.
    pub fn stored_digest(&self, evidence_id: &EvidenceId) -> Result<HashDigest, EngineError> {
        let document = self.load_document(evidence_id)?;
        Ok(hash_evidence_document(&document).map_err(TruthError::from)?)
    }

    /// Loads a stored bundle document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when no bundle is stored under the id.
    pub fn load_document(&self, evidence_id: &EvidenceId) -> Result<Value, EngineError> {
        self.store.get(evidence_id)?.ok_or_else(|| EngineError::NotFound(evidence_id.clone()))
    }

    /// Regenerates a stored bundle under its pinned ruleset.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when loading or regeneration fails.
    pub fn regenerate(&self, evidence_id: &EvidenceId) -> Result<Regeneration, EngineError> {
        let result = self
            .load_document(evidence_id)
            .and_then(|document| Ok(self.regenerator().replay(&document)?));
        match &result {
            Ok(regeneration) => {
                self.audit.record(&EvidenceAuditEvent::new(EvidenceAuditEventParams {
                    kind: AuditEventKind::EvidenceRegenerated,
                    evidence_id: evidence_id.to_string(),
                    tenant_key: Some(regeneration.bundle.tenant_key.to_string()),
                    ruleset_version: Some(regeneration.clearance.pinned_ruleset.to_string()),
                    outcome: AuditOutcome::Ok,
                    inserted: None,
                    differences: None,
                    error_kind: None,
                    bundle_hash: None,
                }));
            }
            Err(err) => self.record_failure(evidence_id, None, err),
        }
        result
    }

    /// Verifies a stored bundle against its regenerated verdict.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when loading or regeneration fails. A mismatch
    /// is not an error; it is reported in the returned report.
    pub fn verify(&self, evidence_id: &EvidenceId) -> Result<VerificationReport, EngineError> {
        let verifier = Verifier::new(self.regenerator());
        let result = self
            .load_document(evidence_id)
            .and_then(|document| Ok(verifier.verify_document(&document)?));
        match &result {
            Ok(report) => {
                let outcome =
                    if report.matches { AuditOutcome::Ok } else { AuditOutcome::Mismatch };
                self.audit.record(&EvidenceAuditEvent::new(EvidenceAuditEventParams {
                    kind: AuditEventKind::EvidenceVerified,
                    evidence_id: evidence_id.to_string(),
                    tenant_key: None,
                    ruleset_version: Some(report.pinned_ruleset_version.to_string()),
                    outcome,
                    inserted: None,
                    differences: Some(report.differences.len()),
                    error_kind: None,
                    bundle_hash: None,
                }));
            }
            Err(err) => self.record_failure(evidence_id, None, err),
        }
        result
    }

    /// Evaluates a stored bundle under the current ruleset for one tenant.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when loading fails, the tenant does not own the
    /// bundle, or evaluation fails.
    pub fn shadow(
        &self,
        tenant_key: &TenantKey,
        evidence_id: &EvidenceId,
        evaluated_at: Timestamp,
    ) -> Result<ShadowEvaluationResult, EngineError> {
        let evaluator = ShadowEvaluator::new(&self.rulesets, &self.migrations);
        let result = self.load_document(evidence_id).and_then(|document| {
            Ok(evaluator.evaluate_shadow_document(tenant_key, &document, evaluated_at)?)
        });
        match &result {
            Ok(shadow) => {
                let outcome =
                    if shadow.has_differences { AuditOutcome::Mismatch } else { AuditOutcome::Ok };
                self.audit.record(&EvidenceAuditEvent::new(EvidenceAuditEventParams {
                    kind: AuditEventKind::ShadowEvaluated,
                    evidence_id: evidence_id.to_string(),
                    tenant_key: Some(tenant_key.to_string()),
                    ruleset_version: Some(shadow.shadow_ruleset_version.to_string()),
                    outcome,
                    inserted: None,
                    differences: Some(shadow.differences.len()),
                    error_kind: None,
                    bundle_hash: None,
                }));
            }
            Err(err) => self.record_failure(evidence_id, Some(tenant_key), err),
        }
        result
    }

    /// Records a failed regeneration-path operation.
    fn record_failure(
        &self,
        evidence_id: &EvidenceId,
        tenant_key: Option<&TenantKey>,
        err: &EngineError,
    ) {
        self.audit.record(&EvidenceAuditEvent::new(EvidenceAuditEventParams {
            kind: AuditEventKind::RegenerationFailed,
            evidence_id: evidence_id.to_string(),
            tenant_key: tenant_key.map(ToString::to_string),
            ruleset_version: None,
            outcome: AuditOutcome::Error,
            inserted: None,
            differences: None,
            error_kind: Some(err.kind_label()),
            bundle_hash: None,
        }));
    }
}

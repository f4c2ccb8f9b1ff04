// crates/truth-evidence-core/src/runtime/ruleset.rs
// ============================================================================
// Module: Ruleset Registry
// Description: Append-only registry of versioned truth evaluators.
// Purpose: Resolve pinned ruleset versions without ever falling back.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The registry maps a ruleset version to an immutable evaluator. It is
//! populated once at process start from the built-in table and then behaves
//! as an append-only map:
//! - [`RulesetRegistry::register`] rejects an existing version with
//!   `ALREADY_EXISTS`; the check and insert happen under one write lock, so
//!   exactly one of several racing registrations succeeds.
//! - [`RulesetRegistry::get`] rejects an unknown version with `NOT_FOUND`.
//!   It never substitutes the current version.
//! - [`RulesetRegistry::current_version`] is the only place "current" is
//!   resolved. Regeneration never calls it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::RwLock;

use serde::Serialize;

use crate::core::error::RulesetErrorReason;
use crate::core::error::RulesetInvariantError;
use crate::core::error::TruthError;
use crate::core::identifiers::RulesetVersion;
use crate::core::time::Timestamp;
use crate::core::truth::OutputTruthMetadata;
use crate::core::truth::TruthInputs;
use crate::runtime::rules::RuleProfile;
use crate::runtime::rules::ThresholdRuleset;

// ============================================================================
// SECTION: Ruleset Trait
// ============================================================================

/// Pure verdict function for one ruleset version.
///
/// Implementations must read only their inputs: no clock, no I/O, no shared
/// mutable state.
pub trait TruthRuleset: Send + Sync {
    /// Computes the verdict for a set of inputs.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError`] when inputs are invalid or a verdict invariant
    /// would be violated.
    fn compute_truth(&self, inputs: &TruthInputs) -> Result<OutputTruthMetadata, TruthError>;
}

// ============================================================================
// SECTION: Ruleset Definition
// ============================================================================

/// Registered ruleset entry.
#[derive(Clone)]
pub struct RulesetDefinition {
    /// Unique ruleset version.
    pub version: RulesetVersion,
    /// Human-readable description.
    pub description: String,
    /// Publication instant.
    pub created_at: Timestamp,
    /// Evaluator implementation.
    compute: Arc<dyn TruthRuleset>,
}

impl RulesetDefinition {
    /// Creates a ruleset definition.
    #[must_use]
    pub fn new(
        version: RulesetVersion,
        description: impl Into<String>,
        created_at: Timestamp,
        compute: Arc<dyn TruthRuleset>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            created_at,
            compute,
        }
    }

    /// Evaluates inputs and checks the verdict carries this version.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError`] when evaluation fails or the verdict is stamped
    /// with a different ruleset version (`SCHEMA_MISMATCH`).
    pub fn compute_truth(&self, inputs: &TruthInputs) -> Result<OutputTruthMetadata, TruthError> {
        let verdict = self.compute.compute_truth(inputs)?;
        if verdict.ruleset_version != self.version {
            return Err(TruthError::Ruleset(RulesetInvariantError {
                version: self.version.clone(),
                reason: RulesetErrorReason::SchemaMismatch,
            }));
        }
        Ok(verdict)
    }

    /// Returns a serializable summary of the definition.
    #[must_use]
    pub fn summary(&self, current: bool) -> RulesetSummary {
        RulesetSummary {
            version: self.version.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
            current,
        }
    }
}

impl std::fmt::Debug for RulesetDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesetDefinition")
            .field("version", &self.version)
            .field("description", &self.description)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Listing entry for a registered ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesetSummary {
    /// Ruleset version.
    pub version: RulesetVersion,
    /// Human-readable description.
    pub description: String,
    /// Publication instant.
    pub created_at: Timestamp,
    /// True when new evidence is stamped with this version.
    pub current: bool,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Append-only ruleset registry.
#[derive(Debug, Default)]
pub struct RulesetRegistry {
    /// Registered definitions keyed by version.
    entries: RwLock<BTreeMap<RulesetVersion, RulesetDefinition>>,
    /// Version stamped on new evidence.
    current: RwLock<Option<RulesetVersion>>,
}

impl RulesetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in ruleset, with the newest
    /// version current.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError`] when the built-in table is inconsistent.
    pub fn builtin() -> Result<Self, TruthError> {
        let registry = Self::new();
        let mut newest = None;
        for profile in RuleProfile::builtin() {
            let created_at = Timestamp::from_unix_seconds(profile.published_unix_seconds)
                .map_err(|err| TruthError::Registry(err.to_string()))?;
            let version = profile.version();
            registry.register(RulesetDefinition::new(
                version.clone(),
                profile.description,
                created_at,
                Arc::new(ThresholdRuleset::new(profile)),
            ))?;
            newest = Some(version);
        }
        if let Some(version) = newest {
            registry.set_current(&version)?;
        }
        Ok(registry)
    }

    /// Registers a definition.
    ///
    /// # Errors
    ///
    /// Returns `ALREADY_EXISTS` when the version is taken, or
    /// `SCHEMA_MISMATCH` when the definition's version is blank.
    pub fn register(&self, definition: RulesetDefinition) -> Result<(), TruthError> {
        if definition.version.is_blank() {
            return Err(TruthError::Ruleset(RulesetInvariantError {
                version: definition.version,
                reason: RulesetErrorReason::SchemaMismatch,
            }));
        }
        let mut guard = self
            .entries
            .write()
            .map_err(|_| TruthError::Registry("ruleset registry lock poisoned".to_string()))?;
        if guard.contains_key(&definition.version) {
            return Err(TruthError::Ruleset(RulesetInvariantError {
                version: definition.version,
                reason: RulesetErrorReason::AlreadyExists,
            }));
        }
        guard.insert(definition.version.clone(), definition);
        drop(guard);
        Ok(())
    }

    /// Resolves a ruleset by exact version.
    ///
    /// # Errors
    ///
    /// Returns `NOT_FOUND` when the version is not registered.
    pub fn get(&self, version: &RulesetVersion) -> Result<RulesetDefinition, TruthError> {
        let guard = self
            .entries
            .read()
            .map_err(|_| TruthError::Registry("ruleset registry lock poisoned".to_string()))?;
        guard
            .get(version)
            .cloned()
            .ok_or_else(|| TruthError::Ruleset(RulesetInvariantError::not_found(version.clone())))
    }

    /// Returns true when the version is registered.
    #[must_use]
    pub fn contains(&self, version: &RulesetVersion) -> bool {
        self.entries.read().is_ok_and(|guard| guard.contains_key(version))
    }

    /// Returns the version new evidence should be stamped with.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::Registry`] when no current version is set.
    pub fn current_version(&self) -> Result<RulesetVersion, TruthError> {
        let guard = self
            .current
            .read()
            .map_err(|_| TruthError::Registry("ruleset registry lock poisoned".to_string()))?;
        guard
            .clone()
            .ok_or_else(|| TruthError::Registry("no current ruleset version set".to_string()))
    }

    /// Selects the version new evidence is stamped with.
    ///
    /// # Errors
    ///
    /// Returns `NOT_FOUND` when the version is not registered.
    pub fn set_current(&self, version: &RulesetVersion) -> Result<(), TruthError> {
        if !self.contains(version) {
            return Err(TruthError::Ruleset(RulesetInvariantError::not_found(version.clone())));
        }
        let mut guard = self
            .current
            .write()
            .map_err(|_| TruthError::Registry("ruleset registry lock poisoned".to_string()))?;
        *guard = Some(version.clone());
        drop(guard);
        Ok(())
    }

    /// Returns registered versions in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::Registry`] when the registry lock is poisoned.
    pub fn versions(&self) -> Result<Vec<RulesetVersion>, TruthError> {
        let guard = self
            .entries
            .read()
            .map_err(|_| TruthError::Registry("ruleset registry lock poisoned".to_string()))?;
        Ok(guard.keys().cloned().collect())
    }

    /// Returns summaries of every registered ruleset.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::Registry`] when the registry lock is poisoned.
    pub fn summaries(&self) -> Result<Vec<RulesetSummary>, TruthError> {
        let current = self.current_version().ok();
        let guard = self
            .entries
            .read()
            .map_err(|_| TruthError::Registry("ruleset registry lock poisoned".to_string()))?;
        Ok(guard
            .values()
            .map(|definition| definition.summary(current.as_ref() == Some(&definition.version)))
            .collect())
    }
}

// crates/truth-evidence-core/src/runtime/migration.rs
// ============================================================================
// Module: Schema Migration Registry
// Description: Append-only chain of pure evidence-document upgrades.
// Purpose: Bring historical bundle documents to the current schema shape.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! Each registered [`SchemaMigration`] upgrades a bundle document from one
//! schema version to the next. [`MigrationRegistry::apply`] walks the chain
//! from the document's `schemaVersion` to the target, applying every link in
//! order and stamping the new version after each step. A missing link, a
//! failing link, or a cycle is a [`SchemaMigrationError`]; a document is
//! never passed through unchanged when a migration was required.
//!
//! Migrations operate on raw JSON so that shapes the typed model no longer
//! describes can still be read. They never add or alter `rulesetVersion`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::RwLock;

use serde_json::Map;
use serde_json::Value;

use crate::core::error::SchemaMigrationError;
use crate::core::error::TruthError;
use crate::core::evidence::CURRENT_SCHEMA_VERSION;
use crate::core::evidence::fields;
use crate::core::identifiers::SchemaVersion;

// ============================================================================
// SECTION: Types
// ============================================================================

/// JSON object form of a bundle document.
pub type BundleObject = Map<String, Value>;

/// Pure upgrade function for one migration link.
pub type MigrationFn = fn(BundleObject) -> Result<BundleObject, String>;

/// One link in the migration chain.
#[derive(Debug, Clone)]
pub struct SchemaMigration {
    /// Source schema version.
    pub from: SchemaVersion,
    /// Produced schema version.
    pub to: SchemaVersion,
    /// Human-readable description.
    pub description: &'static str,
    /// Upgrade function.
    pub apply: MigrationFn,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Append-only migration registry keyed by source schema version.
#[derive(Debug)]
pub struct MigrationRegistry {
    /// Schema version every chain must reach.
    target: SchemaVersion,
    /// Registered links keyed by source version.
    steps: RwLock<BTreeMap<SchemaVersion, SchemaMigration>>,
}

impl MigrationRegistry {
    /// Creates an empty registry targeting a schema version.
    #[must_use]
    pub fn new(target: SchemaVersion) -> Self {
        Self {
            target,
            steps: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates a registry with the built-in chain to the current schema.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::Registry`] when the built-in chain is inconsistent.
    pub fn builtin() -> Result<Self, TruthError> {
        let registry = Self::new(SchemaVersion::new(CURRENT_SCHEMA_VERSION));
        registry.register(SchemaMigration {
            from: SchemaVersion::new("1"),
            to: SchemaVersion::new("2"),
            description: "ISO timestamp field names and structured missingData",
            apply: migrate_v1_to_v2,
        })?;
        registry.register(SchemaMigration {
            from: SchemaVersion::new("2"),
            to: SchemaVersion::new("3"),
            description: "validity window in seconds and environmentFacts",
            apply: migrate_v2_to_v3,
        })?;
        Ok(registry)
    }

    /// Registers a migration link.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::Registry`] when a link from the same source
    /// version exists or the link maps a version onto itself.
    pub fn register(&self, migration: SchemaMigration) -> Result<(), TruthError> {
        if migration.from == migration.to {
            return Err(TruthError::Registry(format!(
                "schema migration {} maps onto itself",
                migration.from
            )));
        }
        let mut guard = self
            .steps
            .write()
            .map_err(|_| TruthError::Registry("migration registry lock poisoned".to_string()))?;
        if guard.contains_key(&migration.from) {
            return Err(TruthError::Registry(format!(
                "schema migration from {} already registered",
                migration.from
            )));
        }
        guard.insert(migration.from.clone(), migration);
        drop(guard);
        Ok(())
    }

    /// Returns the target schema version.
    #[must_use]
    pub const fn target_version(&self) -> &SchemaVersion {
        &self.target
    }

    /// Returns true when a document at `version` must be migrated.
    #[must_use]
    pub fn needs_migration(&self, version: &SchemaVersion) -> bool {
        *version != self.target
    }

    /// Returns the versions a document passes through on its way to the
    /// target, excluding the starting version.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::SchemaMigration`] when a link is missing or the
    /// chain cycles.
    pub fn migration_path(&self, from: &SchemaVersion) -> Result<Vec<SchemaVersion>, TruthError> {
        let guard = self
            .steps
            .read()
            .map_err(|_| TruthError::Registry("migration registry lock poisoned".to_string()))?;
        let chain = self.walk(&guard, from)?;
        Ok(chain.into_iter().map(|step| step.to.clone()).collect())
    }

    /// Migrates a bundle document to the target schema version.
    ///
    /// # Errors
    ///
    /// Returns [`TruthError::Validation`] when the document has no usable
    /// `schemaVersion`, and [`TruthError::SchemaMigration`] when the chain is
    /// broken or a link cannot convert the document.
    pub fn apply(&self, document: &Value) -> Result<Value, TruthError> {
        let Value::Object(object) = document else {
            return Err(TruthError::Validation("bundle document is not an object".to_string()));
        };
        let from = document_schema_version(document)?;
        if !self.needs_migration(&from) {
            return Ok(document.clone());
        }
        let guard = self
            .steps
            .read()
            .map_err(|_| TruthError::Registry("migration registry lock poisoned".to_string()))?;
        let chain = self.walk(&guard, &from)?;
        let mut current = object.clone();
        for step in chain {
            let mut upgraded = (step.apply)(current).map_err(|detail| SchemaMigrationError {
                from_version: step.from.clone(),
                to_version: step.to.clone(),
                detail,
            })?;
            upgraded.insert(fields::SCHEMA_VERSION.to_string(), Value::String(step.to.to_string()));
            current = upgraded;
        }
        drop(guard);
        Ok(Value::Object(current))
    }

    /// Resolves the ordered chain of links from `from` to the target.
    fn walk<'a>(
        &self,
        steps: &'a BTreeMap<SchemaVersion, SchemaMigration>,
        from: &SchemaVersion,
    ) -> Result<Vec<&'a SchemaMigration>, TruthError> {
        let mut chain = Vec::new();
        let mut visited = BTreeSet::new();
        let mut cursor = from.clone();
        while cursor != self.target {
            let Some(step) = steps.get(&cursor) else {
                return Err(SchemaMigrationError {
                    from_version: cursor,
                    to_version: self.target.clone(),
                    detail: "no registered migration".to_string(),
                }
                .into());
            };
            if !visited.insert(cursor.clone()) {
                return Err(SchemaMigrationError {
                    from_version: cursor,
                    to_version: self.target.clone(),
                    detail: "migration chain cycles".to_string(),
                }
                .into());
            }
            chain.push(step);
            cursor = step.to.clone();
        }
        Ok(chain)
    }
}

/// Reads the `schemaVersion` field of a bundle document.
///
/// # Errors
///
/// Returns [`TruthError::Validation`] when the field is missing, not a
/// string, or blank.
pub fn document_schema_version(document: &Value) -> Result<SchemaVersion, TruthError> {
    match document.get(fields::SCHEMA_VERSION) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(SchemaVersion::new(text)),
        Some(_) => {
            Err(TruthError::Validation("schemaVersion must be a non-empty string".to_string()))
        }
        None => Err(TruthError::Validation("bundle missing schemaVersion".to_string())),
    }
}

// ============================================================================
// SECTION: Built-in Migrations
// ============================================================================

/// Seconds per hour for validity window conversion.
const SECONDS_PER_HOUR: u64 = 3_600;

/// Reason code assigned to missing datasets recorded before reasons existed.
const UNSPECIFIED_REASON_CODE: &str = "UNSPECIFIED";

/// Schema 1 to 2: ISO-suffixed timestamp names and structured missing data.
fn migrate_v1_to_v2(mut bundle: BundleObject) -> Result<BundleObject, String> {
    rename_field(&mut bundle, "createdAt", "createdAtISO")?;
    rename_field(&mut bundle, "generatedAt", "generatedAtISO")?;
    let entries = match bundle.remove(fields::MISSING_DATA) {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err("missingData must be an array".to_string()),
        None => return Err("missing field missingData".to_string()),
    };
    let mut structured = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::String(name) => {
                let mut object = Map::new();
                object.insert("datasetName".to_string(), Value::String(name));
                object.insert(
                    "reasonCode".to_string(),
                    Value::String(UNSPECIFIED_REASON_CODE.to_string()),
                );
                object.insert("description".to_string(), Value::String(String::new()));
                structured.push(Value::Object(object));
            }
            other => {
                return Err(format!("missingData entry must be a dataset name, got {other}"));
            }
        }
    }
    bundle.insert(fields::MISSING_DATA.to_string(), Value::Array(structured));
    Ok(bundle)
}

/// Schema 2 to 3: validity window in seconds and `environmentFacts`.
fn migrate_v2_to_v3(mut bundle: BundleObject) -> Result<BundleObject, String> {
    let Some(Value::Object(inputs)) = bundle.get_mut(fields::NORMALIZED_INPUTS) else {
        return Err("normalizedInputs must be an object".to_string());
    };
    let hours = inputs
        .remove("validityWindowHours")
        .and_then(|value| value.as_u64())
        .ok_or_else(|| "normalizedInputs.validityWindowHours must be an integer".to_string())?;
    let seconds = hours
        .checked_mul(SECONDS_PER_HOUR)
        .ok_or_else(|| format!("validityWindowHours {hours} overflows seconds"))?;
    inputs.insert("validityWindowSeconds".to_string(), Value::from(seconds));
    rename_field(&mut bundle, "platformFacts", fields::ENVIRONMENT_FACTS)?;
    Ok(bundle)
}

/// Moves a required top-level field to a new name.
fn rename_field(bundle: &mut BundleObject, from: &str, to: &str) -> Result<(), String> {
    if bundle.contains_key(to) {
        return Err(format!("field {to} already present"));
    }
    let value = bundle.remove(from).ok_or_else(|| format!("missing field {from}"))?;
    bundle.insert(to.to_string(), value);
    Ok(())
}

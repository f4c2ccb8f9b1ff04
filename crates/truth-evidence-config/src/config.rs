// crates/truth-evidence-config/src/config.rs
// ============================================================================
// Module: Truth Evidence Configuration
// Description: Configuration loading and validation for the evidence engine.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: truth-evidence-core, truth-evidence-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: no store is opened and no
//! audit file is created until every section validates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use truth_evidence_core::DEFAULT_MAX_BUNDLE_BYTES;
use truth_evidence_core::RulesetRegistry;
use truth_evidence_core::RulesetVersion;
use truth_evidence_store_sqlite::MAX_BUNDLE_BYTES;
use truth_evidence_store_sqlite::SqliteStoreConfig;
use truth_evidence_store_sqlite::SqliteStoreMode;
use truth_evidence_store_sqlite::SqliteSyncMode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "truth-evidence.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TRUTH_EVIDENCE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Smallest accepted bundle size limit in bytes.
pub const MIN_BUNDLE_LIMIT_BYTES: usize = 1024;
/// Largest accepted bundle size limit in bytes.
pub const MAX_BUNDLE_LIMIT_BYTES: usize = MAX_BUNDLE_BYTES;
/// Longest accepted `SQLite` busy timeout in milliseconds.
pub const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Evidence engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TruthEvidenceConfig {
    /// Evidence store configuration.
    #[serde(default)]
    pub store: EvidenceStoreConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Ruleset selection.
    #[serde(default)]
    pub rulesets: RulesetConfig,
    /// Size limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl TruthEvidenceConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, then [`CONFIG_ENV_VAR`], then
    /// `truth-evidence.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.audit.validate()?;
        self.rulesets.validate()?;
        self.limits.validate()?;
        Ok(())
    }

    /// Returns the `SQLite` store settings when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_store_config(&self) -> Option<SqliteStoreConfig> {
        match self.store.store_type {
            EvidenceStoreType::Memory => None,
            EvidenceStoreType::Sqlite => {
                let path = self.store.path.clone()?;
                Some(SqliteStoreConfig {
                    path,
                    busy_timeout_ms: self.store.busy_timeout_ms,
                    journal_mode: self.store.journal_mode,
                    sync_mode: self.store.sync_mode,
                    max_bundle_bytes: Some(self.limits.max_bundle_bytes),
                })
            }
        }
    }
}

/// Evidence store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceStoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: EvidenceStoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for EvidenceStoreConfig {
    fn default() -> Self {
        Self {
            store_type: EvidenceStoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl EvidenceStoreConfig {
    /// Validates evidence store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            EvidenceStoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            EvidenceStoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_file_path("store.path", path)?;
                if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
                    return Err(ConfigError::Invalid(format!(
                        "store.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Evidence store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// JSON-lines file path when using the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.sink {
            AuditSinkKind::File => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("file audit sink requires path".to_string())
                })?;
                validate_file_path("audit.path", path)
            }
            AuditSinkKind::None | AuditSinkKind::Stderr => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "audit.path is only valid for the file sink".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Audit sink kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard audit events.
    None,
    /// Write JSON lines to stderr.
    #[default]
    Stderr,
    /// Append JSON lines to a file.
    File,
}

/// Ruleset selection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesetConfig {
    /// Ruleset used for new evidence; defaults to the built-in current.
    #[serde(default)]
    pub current: Option<String>,
}

impl RulesetConfig {
    /// Returns the configured current ruleset, if any.
    #[must_use]
    pub fn current_version(&self) -> Option<RulesetVersion> {
        self.current.as_deref().map(RulesetVersion::new)
    }

    /// Validates that the configured ruleset is built in.
    fn validate(&self) -> Result<(), ConfigError> {
        let Some(version) = self.current_version() else {
            return Ok(());
        };
        if version.is_blank() {
            return Err(ConfigError::Invalid("rulesets.current must be non-empty".to_string()));
        }
        let registry = RulesetRegistry::builtin()
            .map_err(|err| ConfigError::Invalid(format!("built-in rulesets: {err}")))?;
        if !registry.contains(&version) {
            return Err(ConfigError::Invalid(format!(
                "rulesets.current names unknown ruleset {version}"
            )));
        }
        Ok(())
    }
}

/// Size limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum canonical bundle size in bytes.
    #[serde(default = "default_max_bundle_bytes")]
    pub max_bundle_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_bundle_bytes: default_max_bundle_bytes(),
        }
    }
}

impl LimitsConfig {
    /// Validates limit ranges.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BUNDLE_LIMIT_BYTES ..= MAX_BUNDLE_LIMIT_BYTES).contains(&self.max_bundle_bytes) {
            return Err(ConfigError::Invalid(format!(
                "limits.max_bundle_bytes must be between {MIN_BUNDLE_LIMIT_BYTES} and \
                 {MAX_BUNDLE_LIMIT_BYTES}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default busy timeout for the `SQLite` store.
const fn default_store_busy_timeout_ms() -> u64 {
    5_000
}

/// Default bundle size limit.
const fn default_max_bundle_bytes() -> usize {
    DEFAULT_MAX_BUNDLE_BYTES
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured file path against length constraints.
fn validate_file_path(field: &str, path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

    use super::*;

    #[test]
    fn validate_file_path_rejects_whitespace_only() {
        let err = validate_file_path("store.path", Path::new("   ")).unwrap_err();
        assert!(err.to_string().contains("store.path must be non-empty"));
    }

    #[test]
    fn validate_file_path_accepts_component_at_max() {
        let component = "a".repeat(MAX_PATH_COMPONENT_LENGTH);
        assert!(validate_file_path("audit.path", Path::new(&component)).is_ok());
    }

    #[test]
    fn validate_file_path_rejects_component_too_long() {
        let component = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let err = validate_file_path("audit.path", Path::new(&component)).unwrap_err();
        assert!(err.to_string().contains("audit.path path component too long"));
    }

    #[test]
    fn validate_path_rejects_total_length() {
        let path = "a/".repeat(MAX_TOTAL_PATH_LENGTH);
        let err = validate_path(Path::new(&path)).unwrap_err();
        assert!(err.to_string().contains("config path exceeds max length"));
    }

    #[test]
    fn resolve_path_prefers_explicit_argument() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }
}

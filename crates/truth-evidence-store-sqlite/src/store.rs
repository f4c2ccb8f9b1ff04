// crates/truth-evidence-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Evidence Store
// Description: Durable append-only EvidenceStore backed by SQLite.
// Purpose: Persist evidence bundles as canonical JSON with integrity hashes.
// Dependencies: truth-evidence-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`EvidenceStore`] using `SQLite`. Each
//! append writes the canonical JSON bytes of a bundle document together with
//! their digest; an existing row is never replaced. Loads re-hash the stored
//! bytes and fail closed on corruption, so a record edited behind the store's
//! back is reported rather than replayed.
//!
//! The row digest covers the stored bytes and is independent of any
//! `bundleHash` embedded in the document, which the verifier checks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use truth_evidence_core::AppendOutcome;
use truth_evidence_core::EvidenceId;
use truth_evidence_core::EvidenceStore;
use truth_evidence_core::StoreError;
use truth_evidence_core::TenantKey;
use truth_evidence_core::hashing::DEFAULT_HASH_ALGORITHM;
use truth_evidence_core::hashing::HashAlgorithm;
use truth_evidence_core::hashing::canonical_json_bytes;
use truth_evidence_core::hashing::hash_bytes;
use truth_evidence_core::interfaces::ensure_document_key;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Hard upper bound on a stored bundle's canonical size.
pub const MAX_BUNDLE_BYTES: usize = 4 * 1024 * 1024;
/// Persisted field holding the tenant key.
const TENANT_KEY_FIELD: &str = "tenantKey";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` evidence store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
/// - `max_bundle_bytes`, when set, must be greater than zero and no more than
///   [`MAX_BUNDLE_BYTES`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Optional maximum canonical bundle size in bytes.
    #[serde(default)]
    pub max_bundle_bytes: Option<usize>,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default settings for a database path.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            max_bundle_bytes: None,
        }
    }

    /// Returns the effective bundle size limit.
    #[must_use]
    pub const fn bundle_limit(&self) -> usize {
        match self.max_bundle_bytes {
            Some(limit) => limit,
            None => MAX_BUNDLE_BYTES,
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Validates size limits in the store configuration.
fn validate_limits(config: &SqliteStoreConfig) -> Result<(), SqliteStoreError> {
    if let Some(max_bytes) = config.max_bundle_bytes
        && (max_bytes == 0 || max_bytes > MAX_BUNDLE_BYTES)
    {
        return Err(SqliteStoreError::Invalid(format!(
            "max_bundle_bytes out of range: {max_bytes} (max {MAX_BUNDLE_BYTES})"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw bundle payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Store payload exceeded configured size limits.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "bundle_json exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed append-only evidence store.
///
/// # Invariants
/// - Bundle loads verify stored hashes before deserialization.
/// - An evidence identifier is written at most once.
/// - `SQLite` connection access is serialized through a mutex.
#[derive(Clone)]
pub struct SqliteEvidenceStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

/// Summary metadata for a stored bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBundleSummary {
    /// Evidence identifier.
    pub evidence_id: EvidenceId,
    /// Tenant key.
    pub tenant_key: TenantKey,
    /// Stored payload hash.
    pub bundle_hash: String,
    /// Stored hash algorithm label.
    pub hash_algorithm: String,
    /// Stored payload length in bytes.
    pub bundle_bytes: usize,
    /// Timestamp when the bundle was stored (unix milliseconds).
    pub stored_at: i64,
}

/// Validated and hashed append payload.
struct PreparedBundle {
    /// Tenant key read from the document.
    tenant_key: String,
    /// Canonical JSON bytes.
    bundle_json: Vec<u8>,
    /// Hash of `bundle_json`.
    bundle_hash: String,
    /// Hash algorithm used.
    hash_algorithm: HashAlgorithm,
}

/// Raw payload for a stored bundle.
struct BundlePayload {
    /// Stored canonical JSON bytes.
    bytes: Vec<u8>,
    /// Stored hash value for the payload.
    hash_value: String,
    /// Stored hash algorithm label.
    hash_algorithm: String,
}

impl SqliteEvidenceStore {
    /// Opens an `SQLite`-backed evidence store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        validate_limits(&config)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query fails.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))?;
        guard
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(())
    }

    /// Loads a bundle document, verifying the stored hash.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Corrupt`] on hash mismatch and
    /// [`SqliteStoreError::Invalid`] when the payload does not decode or its
    /// `evidenceId` differs from the key.
    pub fn load_bundle(&self, evidence_id: &EvidenceId) -> Result<Option<Value>, SqliteStoreError> {
        let Some(payload) = self.fetch_payload(evidence_id)? else {
            return Ok(None);
        };
        let algorithm = HashAlgorithm::from_label(&payload.hash_algorithm).ok_or_else(|| {
            SqliteStoreError::Invalid(format!(
                "unsupported hash algorithm: {}",
                payload.hash_algorithm
            ))
        })?;
        let expected = hash_bytes(algorithm, &payload.bytes);
        if expected.value != payload.hash_value {
            return Err(SqliteStoreError::Corrupt(format!(
                "hash mismatch for evidence {evidence_id}"
            )));
        }
        let document: Value = serde_json::from_slice(&payload.bytes)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        ensure_document_key(evidence_id, &document).map_err(|_| {
            SqliteStoreError::Invalid("evidenceId mismatch between key and payload".to_string())
        })?;
        Ok(Some(document))
    }

    /// Appends a bundle document unless the identifier is already stored.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when validation, size limits, or the
    /// insert fail.
    pub fn append_bundle(
        &self,
        evidence_id: &EvidenceId,
        document: &Value,
    ) -> Result<bool, SqliteStoreError> {
        let prepared = self.prepare_bundle(evidence_id, document)?;
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))?;
        let changed = guard
            .execute(
                "INSERT INTO evidence_bundles (evidence_id, tenant_key, bundle_json, bundle_hash, \
                 hash_algorithm, stored_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) ON \
                 CONFLICT(evidence_id) DO NOTHING",
                params![
                    evidence_id.as_str(),
                    prepared.tenant_key,
                    prepared.bundle_json.as_slice(),
                    prepared.bundle_hash,
                    prepared.hash_algorithm.label(),
                    unix_millis()
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(changed == 1)
    }

    /// Lists stored bundles ordered by evidence identifier, optionally for one
    /// tenant.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the query fails or a row is malformed.
    pub fn list_bundles(
        &self,
        tenant_key: Option<&TenantKey>,
    ) -> Result<Vec<StoredBundleSummary>, SqliteStoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))?;
        let mut stmt = guard
            .prepare(
                "SELECT evidence_id, tenant_key, bundle_hash, hash_algorithm, \
                 length(bundle_json), stored_at FROM evidence_bundles WHERE (?1 IS NULL OR \
                 tenant_key = ?1) ORDER BY evidence_id",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(params![tenant_key.map(TenantKey::as_str)], |row| {
                let evidence_id: String = row.get(0)?;
                let tenant_key: String = row.get(1)?;
                let bundle_hash: String = row.get(2)?;
                let hash_algorithm: String = row.get(3)?;
                let length: i64 = row.get(4)?;
                let stored_at: i64 = row.get(5)?;
                Ok((evidence_id, tenant_key, bundle_hash, hash_algorithm, length, stored_at))
            })
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut summaries = Vec::new();
        for row in rows {
            let (evidence_id, tenant_key, bundle_hash, hash_algorithm, length, stored_at) =
                row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let bundle_bytes = usize::try_from(length).map_err(|_| {
                SqliteStoreError::Corrupt(format!("negative bundle length for {evidence_id}"))
            })?;
            summaries.push(StoredBundleSummary {
                evidence_id: EvidenceId::new(evidence_id),
                tenant_key: TenantKey::new(tenant_key),
                bundle_hash,
                hash_algorithm,
                bundle_bytes,
                stored_at,
            });
        }
        Ok(summaries)
    }

    /// Builds a validated and hashed append payload.
    fn prepare_bundle(
        &self,
        evidence_id: &EvidenceId,
        document: &Value,
    ) -> Result<PreparedBundle, SqliteStoreError> {
        ensure_document_key(evidence_id, document)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let tenant_key = document
            .get(TENANT_KEY_FIELD)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| SqliteStoreError::Invalid("document missing tenantKey".to_string()))?
            .to_string();
        let bundle_json = canonical_json_bytes(document)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let max_bytes = self.config.bundle_limit();
        if bundle_json.len() > max_bytes {
            return Err(SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes: bundle_json.len(),
            });
        }
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &bundle_json);
        Ok(PreparedBundle {
            tenant_key,
            bundle_json,
            bundle_hash: digest.value,
            hash_algorithm: digest.algorithm,
        })
    }

    /// Fetches the raw payload for an evidence identifier.
    fn fetch_payload(
        &self,
        evidence_id: &EvidenceId,
    ) -> Result<Option<BundlePayload>, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let metadata = tx
            .query_row(
                "SELECT length(bundle_json), bundle_hash, hash_algorithm FROM evidence_bundles \
                 WHERE evidence_id = ?1",
                params![evidence_id.as_str()],
                |row| {
                    let length: i64 = row.get(0)?;
                    let hash: String = row.get(1)?;
                    let algorithm: String = row.get(2)?;
                    Ok((length, hash, algorithm))
                },
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let Some((length, hash_value, hash_algorithm)) = metadata else {
            return Ok(None);
        };
        let length = usize::try_from(length).map_err(|_| {
            SqliteStoreError::Corrupt(format!("negative bundle length for evidence {evidence_id}"))
        })?;
        let max_bytes = self.config.bundle_limit();
        if length > max_bytes {
            return Err(SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes: length,
            });
        }
        let bytes: Vec<u8> = tx
            .query_row(
                "SELECT bundle_json FROM evidence_bundles WHERE evidence_id = ?1",
                params![evidence_id.as_str()],
                |row| row.get(0),
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(Some(BundlePayload {
            bytes,
            hash_value,
            hash_algorithm,
        }))
    }
}

impl EvidenceStore for SqliteEvidenceStore {
    fn get(&self, evidence_id: &EvidenceId) -> Result<Option<Value>, StoreError> {
        self.load_bundle(evidence_id).map_err(StoreError::from)
    }

    fn append_if_absent(
        &self,
        evidence_id: &EvidenceId,
        document: &Value,
    ) -> Result<AppendOutcome, StoreError> {
        let inserted = self.append_bundle(evidence_id, document)?;
        Ok(AppendOutcome {
            inserted,
        })
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Ensures the parent directory exists for the store path.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS evidence_bundles (
                    evidence_id TEXT PRIMARY KEY,
                    tenant_key TEXT NOT NULL,
                    bundle_json BLOB NOT NULL,
                    bundle_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    stored_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_evidence_bundles_tenant
                    ON evidence_bundles (tenant_key, evidence_id);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

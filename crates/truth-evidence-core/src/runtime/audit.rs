// crates/truth-evidence-core/src/runtime/audit.rs
// ============================================================================
// Module: Evidence Audit Logging
// Description: Structured audit events for evidence engine operations.
// Purpose: Emit JSON-lines audit records without a global logger.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events are emitted by the engine facade only. Compute functions never
//! log, and audit timestamps never feed back into a verdict. Sinks are
//! lightweight so deployments can route events to their preferred pipeline:
//! stderr, an append-only file, or nowhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audited engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// A bundle was sealed and appended.
    EvidenceSealed,
    /// A bundle was regenerated.
    EvidenceRegenerated,
    /// A bundle was verified.
    EvidenceVerified,
    /// A shadow evaluation ran.
    ShadowEvaluated,
    /// Regeneration, verification, or shadow evaluation failed.
    RegenerationFailed,
}

impl AuditEventKind {
    /// Returns the stable event label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EvidenceSealed => "evidence_sealed",
            Self::EvidenceRegenerated => "evidence_regenerated",
            Self::EvidenceVerified => "evidence_verified",
            Self::ShadowEvaluated => "shadow_evaluated",
            Self::RegenerationFailed => "regeneration_failed",
        }
    }
}

/// Operation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Operation completed and found nothing to report.
    Ok,
    /// Operation completed and found differences.
    Mismatch,
    /// Operation failed.
    Error,
}

/// Evidence audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Evidence identifier.
    pub evidence_id: String,
    /// Tenant key when known.
    pub tenant_key: Option<String>,
    /// Ruleset version involved when known.
    pub ruleset_version: Option<String>,
    /// Operation outcome.
    pub outcome: AuditOutcome,
    /// True when the bundle was newly written (seal only).
    pub inserted: Option<bool>,
    /// Number of differences found (verify and shadow only).
    pub differences: Option<usize>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Bundle digest when known.
    pub bundle_hash: Option<String>,
}

/// Inputs required to construct an audit event.
pub struct EvidenceAuditEventParams {
    /// Audited operation.
    pub kind: AuditEventKind,
    /// Evidence identifier.
    pub evidence_id: String,
    /// Tenant key when known.
    pub tenant_key: Option<String>,
    /// Ruleset version involved when known.
    pub ruleset_version: Option<String>,
    /// Operation outcome.
    pub outcome: AuditOutcome,
    /// True when the bundle was newly written (seal only).
    pub inserted: Option<bool>,
    /// Number of differences found (verify and shadow only).
    pub differences: Option<usize>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Bundle digest when known.
    pub bundle_hash: Option<String>,
}

impl EvidenceAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: EvidenceAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: params.kind.as_str(),
            timestamp_ms,
            evidence_id: params.evidence_id,
            tenant_key: params.tenant_key,
            ruleset_version: params.ruleset_version,
            outcome: params.outcome,
            inserted: params.inserted,
            differences: params.differences,
            error_kind: params.error_kind,
            bundle_hash: params.bundle_hash,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for evidence engine events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &EvidenceAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &EvidenceAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &EvidenceAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &EvidenceAuditEvent) {}
}

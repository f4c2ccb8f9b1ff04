// crates/truth-evidence-store-sqlite/src/lib.rs
// ============================================================================
// Module: Truth Evidence SQLite Store
// Description: SQLite-backed evidence store crate.
// Purpose: Expose the durable append-only evidence store.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! Durable [`truth_evidence_core::EvidenceStore`] implementation. Bundles are
//! stored as canonical JSON with their digest and re-hashed on every load.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_BUNDLE_BYTES;
pub use store::SqliteEvidenceStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::StoredBundleSummary;

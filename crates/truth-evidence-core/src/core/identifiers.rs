// crates/truth-evidence-core/src/core/identifiers.rs
// ============================================================================
// Module: Truth Evidence Identifiers
// Description: Canonical opaque identifiers for evidence records and rulesets.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings that serialize transparently. Ruleset and
//! schema versions are identifiers too: they are compared for equality only
//! and never parsed as numbers, so "1.10.0" and "1.1.0" can never alias.
//! Validation happens at the gate and registry boundaries, not here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares a transparent string identifier with the standard conversions.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the provided string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true when the identifier is empty or whitespace only.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_identifier!(
    /// Evidence bundle identifier; unique and immutable once assigned.
    EvidenceId
);

string_identifier!(
    /// Tenant key scoping evidence bundles and shadow evaluations.
    TenantKey
);

string_identifier!(
    /// Identifier of the source-system site the snapshot was read from.
    CloudId
);

string_identifier!(
    /// Ruleset version identifier (registry key).
    RulesetVersion
);

string_identifier!(
    /// Evidence bundle schema version identifier.
    SchemaVersion
);

string_identifier!(
    /// Metadata snapshot identifier assigned by the ingestion path.
    SnapshotId
);

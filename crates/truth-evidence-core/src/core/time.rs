// crates/truth-evidence-core/src/core/time.rs
// ============================================================================
// Module: Truth Evidence Time Model
// Description: Canonical instant representation for evidence records.
// Purpose: Provide deterministic, replayable time values embedded in bundles.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! All instants in evidence records are RFC 3339 strings normalized to UTC.
//! The engine never reads wall-clock time while computing a verdict: "now"
//! for evaluation purposes is always an instant embedded in the record, and
//! callers supply any other instant explicitly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;
use time::Duration;
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when constructing or rendering timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Input text is not a valid RFC 3339 instant.
    #[error("invalid rfc3339 timestamp: {0}")]
    Parse(String),
    /// Instant is outside the representable range.
    #[error("timestamp out of range: {0}")]
    OutOfRange(String),
}

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical UTC instant used in evidence bundles and verdicts.
///
/// # Invariants
/// - The wrapped value always carries a UTC offset.
/// - Serialization is RFC 3339, so parse(format(t)) == t.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Parses an RFC 3339 instant and normalizes it to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Parse`] when the text is not RFC 3339.
    pub fn parse_rfc3339(text: &str) -> Result<Self, TimestampError> {
        let parsed = OffsetDateTime::parse(text, &Rfc3339)
            .map_err(|err| TimestampError::Parse(format!("{text}: {err}")))?;
        Ok(Self(parsed.to_offset(UtcOffset::UTC)))
    }

    /// Creates a timestamp from unix epoch seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::OutOfRange`] when the value is not representable.
    pub fn from_unix_seconds(seconds: i64) -> Result<Self, TimestampError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(Self)
            .map_err(|err| TimestampError::OutOfRange(err.to_string()))
    }

    /// Renders the instant as RFC 3339 text.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::OutOfRange`] when the year cannot be rendered.
    pub fn to_rfc3339(&self) -> Result<String, TimestampError> {
        self.0.format(&Rfc3339).map_err(|err| TimestampError::OutOfRange(err.to_string()))
    }

    /// Returns the seconds elapsed from `earlier` to `self`, rounding any
    /// sub-second remainder up, or `None` when `earlier` is after `self`.
    /// For example 3600.9s elapsed is 3601s.
    #[must_use]
    pub fn elapsed_seconds_ceil(&self, earlier: &Self) -> Option<u64> {
        let elapsed = self.0 - earlier.0;
        if elapsed.is_negative() {
            return None;
        }
        let whole = u64::try_from(elapsed.whole_seconds()).ok()?;
        if elapsed.subsec_nanoseconds() > 0 { whole.checked_add(1) } else { Some(whole) }
    }

    /// Adds a number of seconds, returning `None` on overflow.
    #[must_use]
    pub fn checked_add_seconds(&self, seconds: u64) -> Option<Self> {
        let seconds = i64::try_from(seconds).ok()?;
        self.0.checked_add(Duration::seconds(seconds)).map(Self)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.to_rfc3339().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_rfc3339(&text).map_err(serde::de::Error::custom)
    }
}

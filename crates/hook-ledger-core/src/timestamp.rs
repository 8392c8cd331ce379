//! # Flexible Timestamp Parsing
//!
//! GitLab emits timestamps in several textual layouts depending on the event
//! family and instance version. This module parses all of them into a single
//! canonical UTC instant.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Timestamp layouts without an explicit timezone. Parsed in order after the
/// RFC 3339 attempt; all are interpreted as UTC.
const NAIVE_LAYOUTS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S UTC",
    "%Y-%m-%d %H:%M:%S",
];

/// Error raised when a timestamp string matches none of the known layouts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized timestamp format: '{value}'")]
pub struct TimeFormatError {
    /// The original string, kept verbatim for diagnostics
    pub value: String,
}

/// UTC instant parsed from any of the timestamp layouts GitLab uses
///
/// Ordering of the parse attempts matters: unambiguous zoned layouts are
/// tried before the looser unzoned ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FlexibleTimestamp(DateTime<Utc>);

impl FlexibleTimestamp {
    /// Parse a timestamp string, stripping surrounding JSON quotes if present
    ///
    /// Tries, in order: RFC 3339 with timezone offset (which also covers
    /// fractional seconds and the literal `Z` suffix), then the unzoned
    /// layouts in [`NAIVE_LAYOUTS`].
    pub fn parse(raw: &str) -> Result<Self, TimeFormatError> {
        let value = raw.trim_matches('"');

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self(dt.with_timezone(&Utc)));
        }

        for layout in NAIVE_LAYOUTS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, layout) {
                return Ok(Self(Utc.from_utc_datetime(&naive)));
            }
        }

        Err(TimeFormatError {
            value: raw.to_string(),
        })
    }

    /// Convert to RFC 3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl fmt::Display for FlexibleTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for FlexibleTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl<'de> Deserialize<'de> for FlexibleTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for FlexibleTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

#[cfg(test)]
#[path = "timestamp_tests.rs"]
mod tests;

//! JSON conventions for "unset" values on the wire.
//!
//! The service encodes an unset optional text field or date as the empty
//! string rather than `null`. These helpers map `""` (and `null`, which
//! some rows carry) to `None` on the way in, and `None` back to `""` on the
//! way out, so the Rust side can use plain `Option`s.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};

/// Date format used on the wire (ISO calendar date).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a wire date, tolerating a trailing time component.
///
/// Spreadsheet-backed services sometimes hand back `2024-05-01 00:00:00`
/// for a cell that was written as `2024-05-01`; only the date part is kept.
///
/// # Errors
///
/// Returns the chrono parse error if neither the full string nor its first
/// ten characters form an ISO date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT).or_else(|err| {
        raw.get(..10)
            .map_or(Err(err), |head| NaiveDate::parse_from_str(head, DATE_FORMAT))
    })
}

/// `Option<String>` stored as `""` when unset.
pub mod text {
    use super::{Deserialize, Deserializer, Serializer};

    /// Serializes `None` as `""`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or_default())
    }

    /// Deserializes `""` or `null` as `None`.
    ///
    /// # Errors
    ///
    /// Fails if the value is neither a string nor `null`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.filter(|s| !s.is_empty()))
    }
}

/// `Option<NaiveDate>` stored as an ISO date, or `""` when unset.
pub mod date {
    use super::{DATE_FORMAT, Deserialize, Deserializer, NaiveDate, Serializer, parse_date};

    /// Serializes a date as `YYYY-MM-DD`, `None` as `""`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
            None => serializer.serialize_str(""),
        }
    }

    /// Deserializes `""`/`null` as `None`, anything else as an ISO date.
    ///
    /// The service stores dates as free text, so a string that is not a
    /// date reads as unset instead of failing the whole record.
    ///
    /// # Errors
    ///
    /// Fails if the value is neither a string nor `null`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(match raw.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => parse_date(s)
                .inspect_err(|e| {
                    tracing::debug!(value = s, error = %e, "unreadable date treated as unset");
                })
                .ok(),
        })
    }
}
